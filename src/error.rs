//! Error types for the portal.
//!
//! Every variant is recoverable: it belongs to the stage where it happened and
//! is shown inline on that stage's page.

use thiserror::Error;

/// Result type for portal operations
pub type Result<T> = std::result::Result<T, PortalError>;

/// Errors that can occur while driving a portal session
#[derive(Debug, Error)]
pub enum PortalError {
    /// Email did not pass the domain check
    #[error("Access denied. Please use your {domain} email address.")]
    AuthDenied { domain: String },

    /// The working directory holds no spreadsheet files
    #[error("No Excel files found in the repository.")]
    NoFilesFound,

    /// The continue button was pressed without a file
    #[error("Please choose a file to continue.")]
    NoFileSelected,

    /// Workbook could not be opened or parsed
    #[error("Error loading file {file}: {cause}")]
    LoadFailed { file: String, cause: String },

    /// A filter refers to a column the sheet does not have (or that is not configured)
    #[error("Column '{column}' is not a filter column of sheet '{sheet}'")]
    InvalidFilterColumn { sheet: String, column: String },

    /// A submitted filter option that the filter does not offer
    #[error("Filter '{column}' of sheet '{sheet}' has no option #{option}")]
    InvalidFilterValue {
        sheet: String,
        column: String,
        option: usize,
    },

    /// A sheet name that is not part of the loaded workbook
    #[error("Sheet not found: {0}")]
    UnknownSheet(String),

    /// Action does not belong to the current stage
    #[error("Cannot {action} while in the {stage} stage")]
    InvalidTransition {
        stage: &'static str,
        action: &'static str,
    },

    /// Columns of a dataset do not share one row count
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PortalError {
    /// Build a `LoadFailed` from any displayable cause
    pub fn load_failed(file: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        PortalError::LoadFailed {
            file: file.into(),
            cause: cause.to_string(),
        }
    }

    /// Whether the error is the denied-login case
    pub fn is_auth_denied(&self) -> bool {
        matches!(self, PortalError::AuthDenied { .. })
    }
}
