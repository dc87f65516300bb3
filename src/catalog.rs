use crate::dataset::Workbook;
use crate::error::{PortalError, Result};
use crate::loader::{self, WorkbookSource};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of the spreadsheet files the portal serves
pub const SPREADSHEET_EXTENSION: &str = "xlsx";

/// Prefix Excel uses for its lock/temporary files
pub const TEMP_FILE_MARKER: char = '~';

/// The set of spreadsheet files available in a working directory
#[derive(Clone, Debug)]
pub struct FileCatalog {
    dir: PathBuf,
}

impl FileCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileCatalog { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List spreadsheet files, sorted by name
    ///
    /// Lock files (`~$report.xlsx`) and anything that is not a regular
    /// `.xlsx` file are skipped. An unreadable directory lists as empty.
    pub fn list(&self) -> Vec<String> {
        let mut files = Vec::new();

        if let Ok(entries) = fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                if path.extension().and_then(|ext| ext.to_str()) != Some(SPREADSHEET_EXTENSION) {
                    continue;
                }
                if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                    if !name.starts_with(TEMP_FILE_MARKER) {
                        files.push(name.to_string());
                    }
                }
            }
        }

        files.sort();
        files
    }

    /// Like [`FileCatalog::list`], but an empty catalog is reported as `NoFilesFound`
    pub fn require_files(&self) -> Result<Vec<String>> {
        let files = self.list();
        if files.is_empty() {
            return Err(PortalError::NoFilesFound);
        }
        Ok(files)
    }

    /// Whether `name` is one of the files currently listed
    pub fn contains(&self, name: &str) -> bool {
        self.list().iter().any(|f| f == name)
    }
}

impl WorkbookSource for FileCatalog {
    fn load(&self, name: &str) -> Result<Workbook> {
        // Only catalogued names are opened, so form input cannot point elsewhere
        if !self.contains(name) {
            return Err(PortalError::load_failed(name, "file is not in the catalog"));
        }
        loader::load_workbook(self.dir.join(name))
    }
}
