//! The navigation state machine.
//!
//! A [`Session`] moves through four stages:
//!
//! ```text
//! login -> file_selection -> filter_setup -> data_view
//!                ^                              |
//!                +------------- back -----------+
//! ```
//!
//! Transitions never modify a session in place. [`Session::apply`] takes the
//! current session by reference and returns the next one; on error the caller
//! keeps the session it already has.

use crate::cell::CellValue;
use crate::dataset::{Dataset, Workbook};
use crate::error::{PortalError, Result};
use crate::filter::{self, FilterConfig};
use crate::loader::WorkbookSource;
use crate::login;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One step of the navigation flow
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Login,
    FileSelection,
    FilterSetup,
    DataView,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Login => "login",
            Stage::FileSelection => "file_selection",
            Stage::FilterSetup => "filter_setup",
            Stage::DataView => "data_view",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user decided on the filter setup page
#[derive(Clone, Debug, PartialEq)]
pub enum FilterChoice {
    /// "No, show all data"
    ShowAll,

    /// Filter columns per sheet; sheets left out get no filters
    Configure(BTreeMap<String, Vec<String>>),
}

/// A user action, one per form submission
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Login { email: String },
    SelectFile { file: String },
    ConfigureFilters(FilterChoice),
    SetActiveFilter {
        sheet: String,
        column: String,
        values: Vec<CellValue>,
    },
    Back,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Login { .. } => "log in",
            Action::SelectFile { .. } => "select a file",
            Action::ConfigureFilters(_) => "configure filters",
            Action::SetActiveFilter { .. } => "change a filter",
            Action::Back => "go back",
        }
    }

    fn stage(&self) -> Stage {
        match self {
            Action::Login { .. } => Stage::Login,
            Action::SelectFile { .. } => Stage::FileSelection,
            Action::ConfigureFilters(_) => Stage::FilterSetup,
            Action::SetActiveFilter { .. } | Action::Back => Stage::DataView,
        }
    }
}

/// What a transition needs from outside the session
pub struct Context<'a> {
    /// Suffix accepted by the email gate
    pub email_domain: &'a str,

    /// Where selected files are loaded from
    pub workbooks: &'a dyn WorkbookSource,
}

/// Everything the portal remembers about one user
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub authenticated: bool,
    pub stage: Stage,

    /// Normalized email of the signed-in user
    pub user: Option<String>,

    pub selected_file: Option<String>,
    pub workbook: Option<Arc<Workbook>>,
    pub filter_columns: FilterConfig,

    /// sheet -> column -> selected values
    pub active_filter_values: BTreeMap<String, BTreeMap<String, Vec<CellValue>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one transition and return the resulting session
    ///
    /// # Errors
    /// * `InvalidTransition` if the action does not belong to the current stage
    /// * `AuthDenied` for an email outside the allowed domain
    /// * `NoFileSelected` / `LoadFailed` when picking a file
    /// * `UnknownSheet` / `InvalidFilterColumn` for filter columns the workbook does not have
    pub fn apply(&self, action: Action, ctx: &Context<'_>) -> Result<Session> {
        if action.stage() != self.stage {
            return Err(PortalError::InvalidTransition {
                stage: self.stage.as_str(),
                action: action.name(),
            });
        }

        let next = match action {
            Action::Login { email } => self.login(&email, ctx.email_domain)?,
            Action::SelectFile { file } => self.select_file(&file, ctx.workbooks)?,
            Action::ConfigureFilters(choice) => self.configure_filters(choice)?,
            Action::SetActiveFilter { sheet, column, values } => {
                self.set_active_filter(sheet, column, values)?
            }
            Action::Back => self.back(),
        };

        log::info!("session moved from {} to {}", self.stage, next.stage);
        Ok(next)
    }

    fn login(&self, email: &str, domain: &str) -> Result<Session> {
        if !login::authenticate(email, domain) {
            log::warn!("denied login for {:?}", email.trim());
            return Err(PortalError::AuthDenied {
                domain: domain.to_string(),
            });
        }

        Ok(Session {
            authenticated: true,
            stage: Stage::FileSelection,
            user: Some(login::normalize_email(email)),
            ..Session::default()
        })
    }

    fn select_file(&self, file: &str, workbooks: &dyn WorkbookSource) -> Result<Session> {
        let file = file.trim();
        if file.is_empty() {
            return Err(PortalError::NoFileSelected);
        }

        let workbook = workbooks.load(file).inspect_err(|e| log::warn!("{}", e))?;

        Ok(Session {
            stage: Stage::FilterSetup,
            selected_file: Some(file.to_string()),
            workbook: Some(Arc::new(workbook)),
            filter_columns: FilterConfig::new(),
            active_filter_values: BTreeMap::new(),
            ..self.clone()
        })
    }

    fn configure_filters(&self, choice: FilterChoice) -> Result<Session> {
        let workbook = self.loaded_workbook()?;
        let mut config = FilterConfig::new();

        match choice {
            FilterChoice::ShowAll => config.clear(),
            FilterChoice::Configure(columns) => {
                for (sheet, cols) in &columns {
                    let dataset = workbook
                        .sheet(sheet)
                        .ok_or_else(|| PortalError::UnknownSheet(sheet.clone()))?;
                    config.set_filter_columns(sheet, dataset, cols)?;
                }
            }
        }

        Ok(Session {
            stage: Stage::DataView,
            filter_columns: config,
            active_filter_values: BTreeMap::new(),
            ..self.clone()
        })
    }

    fn set_active_filter(&self, sheet: String, column: String, values: Vec<CellValue>) -> Result<Session> {
        let workbook = self.loaded_workbook()?;
        if workbook.sheet(&sheet).is_none() {
            return Err(PortalError::UnknownSheet(sheet));
        }
        if !self.filter_columns.is_filter_column(&sheet, &column) {
            return Err(PortalError::InvalidFilterColumn { sheet, column });
        }

        let mut selected: Vec<CellValue> = Vec::with_capacity(values.len());
        for value in values {
            if !value.is_missing() && !selected.contains(&value) {
                selected.push(value);
            }
        }

        let mut active = self.active_filter_values.clone();
        let per_sheet = active.entry(sheet.clone()).or_default();
        if selected.is_empty() {
            per_sheet.remove(&column);
        } else {
            per_sheet.insert(column, selected);
        }
        if per_sheet.is_empty() {
            active.remove(&sheet);
        }

        Ok(Session {
            active_filter_values: active,
            ..self.clone()
        })
    }

    fn back(&self) -> Session {
        Session {
            authenticated: true,
            stage: Stage::FileSelection,
            user: self.user.clone(),
            ..Session::default()
        }
    }

    fn loaded_workbook(&self) -> Result<&Workbook> {
        self.workbook.as_deref().ok_or_else(|| PortalError::InvalidTransition {
            stage: self.stage.as_str(),
            action: "use a workbook before one is loaded",
        })
    }

    /// Values currently selected for a filter column, empty if unrestricted
    pub fn active_values(&self, sheet: &str, column: &str) -> &[CellValue] {
        self.active_filter_values
            .get(sheet)
            .and_then(|cols| cols.get(column))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of filter columns of a sheet with a non-empty selection
    pub fn active_filter_count(&self, sheet: &str) -> usize {
        self.filter_columns
            .columns(sheet)
            .iter()
            .filter(|column| !self.active_values(sheet, column).is_empty())
            .count()
    }

    /// A sheet's rows after every active filter has been applied
    pub fn filtered_sheet(&self, sheet: &str) -> Result<Dataset> {
        let workbook = self.loaded_workbook()?;
        let dataset = workbook
            .sheet(sheet)
            .ok_or_else(|| PortalError::UnknownSheet(sheet.to_string()))?;

        let filters: Vec<(&str, &[CellValue])> = self
            .filter_columns
            .columns(sheet)
            .iter()
            .map(|column| (column.as_str(), self.active_values(sheet, column)))
            .collect();

        filter::apply_all(dataset, sheet, &filters)
    }
}
