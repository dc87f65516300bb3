use crate::cell::CellValue;
use crate::dataset::{Dataset, Workbook};
use crate::error::{PortalError, Result};
use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use std::collections::HashMap;
use std::path::Path;

/// Something that can turn a catalogued file name into a workbook
///
/// The navigation state machine only talks to this trait, so tests can hand
/// it an in-memory workbook instead of a directory.
pub trait WorkbookSource {
    fn load(&self, name: &str) -> Result<Workbook>;
}

/// Load every sheet of an Excel file
///
/// The first row of each sheet's used range becomes the header, the rest are
/// data rows. Sheet order follows the file.
///
/// # Arguments
/// * `filepath` - Path to the `.xlsx` file
///
/// # Returns
/// * `Result<Workbook>` - The loaded workbook, or `LoadFailed` with the reason
///
/// # Examples
/// ```no_run
/// use research_portal::loader::load_workbook;
///
/// match load_workbook("data.xlsx") {
///     Ok(workbook) => println!("Loaded {} sheets", workbook.sheets.len()),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn load_workbook(filepath: impl AsRef<Path>) -> Result<Workbook> {
    let path = filepath.as_ref();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let mut excel: Xlsx<_> =
        open_workbook(path).map_err(|e| PortalError::load_failed(&file_name, e))?;

    let sheet_names = excel.sheet_names().to_vec();
    let mut workbook = Workbook::new(&file_name);

    for sheet_name in sheet_names {
        let range = excel
            .worksheet_range(&sheet_name)
            .map_err(|e| PortalError::load_failed(&file_name, format!("sheet '{}': {}", sheet_name, e)))?;
        workbook = workbook.with_sheet(sheet_name, range_to_dataset(&range));
    }

    log::debug!("loaded {} with {} sheet(s)", file_name, workbook.sheets.len());
    Ok(workbook)
}

/// Convert a worksheet range into a dataset, header first
pub fn range_to_dataset(range: &Range<Data>) -> Dataset {
    let mut rows = range.rows();

    let header = match rows.next() {
        Some(cells) => header_names(cells),
        None => return Dataset::default(),
    };

    let data: Vec<Vec<CellValue>> = rows
        .map(|cells| cells.iter().map(cell_value).collect())
        .collect();

    Dataset::from_rows(header, data)
}

/// Convert a calamine cell into a portal value
pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        // formulas such as =IF(..., "") leave an empty string behind
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => CellValue::DateTime(ndt),
            None => CellValue::number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            Ok(ndt) => CellValue::DateTime(ndt),
            Err(_) => CellValue::Text(s.clone()),
        },
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

/// Turn the header row into unique column names
///
/// Blank headers become `Unnamed: <index>`; a name seen before gets a
/// `.1`, `.2`, ... suffix.
fn header_names(cells: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(cells.len());

    for (idx, cell) in cells.iter().enumerate() {
        let base = match cell_value(cell) {
            CellValue::Empty => format!("Unnamed: {}", idx),
            value => {
                let text = value.to_string();
                if text.trim().is_empty() {
                    format!("Unnamed: {}", idx)
                } else {
                    text
                }
            }
        };

        let mut name = base.clone();
        while seen.contains_key(&name) {
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            name = format!("{}.{}", base, count);
        }
        seen.insert(name.clone(), 0);
        names.push(name);
    }

    names
}
