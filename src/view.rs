//! Declarative view model handed to the presentation layer.
//!
//! Pages are rendered from these structs alone. Nothing here knows about
//! particular sheet names; every sheet and filter is described the same way.

use crate::cell::CellValue;
use crate::error::{PortalError, Result};
use crate::filter;
use crate::session::Session;
use serde::Serialize;

/// A sheet on the filter setup page, with its columns as checkboxes
#[derive(Debug, Clone, Serialize)]
pub struct SetupSheet {
    pub index: usize,
    pub name: String,
    pub columns: Vec<SetupColumn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetupColumn {
    pub index: usize,
    pub name: String,
    pub checked: bool,
}

/// One selectable value of a filter
#[derive(Debug, Clone, Serialize)]
pub struct FilterOption {
    pub index: usize,
    pub label: String,
    pub selected: bool,
    #[serde(skip)]
    pub value: CellValue,
}

/// One interactive filter: a configured column of a sheet
#[derive(Debug, Clone, Serialize)]
pub struct FilterDescriptor {
    pub sheet: String,
    pub column: String,

    /// Position among the sheet's filters
    pub index: usize,

    pub options: Vec<FilterOption>,
}

impl FilterDescriptor {
    /// The selected values, looked up by option index
    ///
    /// # Errors
    /// * `PortalError::InvalidFilterValue` for an index this filter does not offer
    pub fn values_for(&self, option_indices: &[usize]) -> Result<Vec<CellValue>> {
        option_indices
            .iter()
            .map(|&i| {
                self.options
                    .get(i)
                    .map(|option| option.value.clone())
                    .ok_or_else(|| PortalError::InvalidFilterValue {
                        sheet: self.sheet.clone(),
                        column: self.column.clone(),
                        option: i,
                    })
            })
            .collect()
    }
}

/// Everything the data view shows for one sheet tab
#[derive(Debug, Clone, Serialize)]
pub struct SheetView {
    pub index: usize,
    pub name: String,
    pub filters: Vec<FilterDescriptor>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
    pub active_filter_count: usize,
}

/// Build the filter setup page model
///
/// Columns already configured in the session come back checked.
pub fn setup_sheets(session: &Session) -> Vec<SetupSheet> {
    let Some(workbook) = session.workbook.as_deref() else {
        return Vec::new();
    };

    workbook
        .sheets
        .iter()
        .enumerate()
        .map(|(index, sheet)| SetupSheet {
            index,
            name: sheet.name.clone(),
            columns: sheet
                .data
                .column_names()
                .into_iter()
                .enumerate()
                .map(|(i, name)| SetupColumn {
                    index: i,
                    name: name.to_string(),
                    checked: session.filter_columns.is_filter_column(&sheet.name, name),
                })
                .collect(),
        })
        .collect()
}

/// Build the view of the sheet at `index`
///
/// Each filter offers the values left after the filters before it have been
/// applied, plus whatever is already selected, so a selection never vanishes
/// from its own list.
pub fn sheet_view(session: &Session, index: usize) -> Result<SheetView> {
    let workbook = session
        .workbook
        .as_deref()
        .ok_or_else(|| PortalError::UnknownSheet(format!("#{}", index)))?;
    let sheet = workbook
        .sheets
        .get(index)
        .ok_or_else(|| PortalError::UnknownSheet(format!("#{}", index)))?;

    let mut data = sheet.data.clone();
    let mut filters = Vec::new();

    for (position, column) in session.filter_columns.columns(&sheet.name).iter().enumerate() {
        let selected = session.active_values(&sheet.name, column);

        let mut values = filter::unique_values(&data, column);
        for value in selected {
            if !values.contains(value) {
                values.push(value.clone());
            }
        }

        let options = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| FilterOption {
                index: i,
                label: value.to_string(),
                selected: selected.contains(&value),
                value,
            })
            .collect();

        filters.push(FilterDescriptor {
            sheet: sheet.name.clone(),
            column: column.clone(),
            index: position,
            options,
        });

        data = filter::apply(&data, column, selected)?;
    }

    Ok(SheetView {
        index,
        name: sheet.name.clone(),
        filters,
        columns: data.column_names().into_iter().map(str::to_string).collect(),
        rows: data
            .rows()
            .map(|row| row.into_iter().map(|v| v.to_string()).collect())
            .collect(),
        total_rows: data.row_count(),
        active_filter_count: session.active_filter_count(&sheet.name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, Dataset, Workbook};
    use crate::filter::FilterConfig;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn session() -> Session {
        let data = Dataset::new(vec![
            Column::new("Region", vec!["East".into(), "West".into(), "East".into(), CellValue::Empty]),
            Column::new("Year", vec![2023i64.into(), 2023i64.into(), 2024i64.into(), 2024i64.into()]),
        ])
        .unwrap();
        let workbook = Workbook::new("data.xlsx")
            .with_sheet("Sales", data.clone())
            .with_sheet("Other", data.clone());

        let mut config = FilterConfig::new();
        config
            .set_filter_columns("Sales", &data, &["Region".into(), "Year".into()])
            .unwrap();

        Session {
            workbook: Some(Arc::new(workbook)),
            filter_columns: config,
            ..Session::default()
        }
    }

    #[test]
    fn setup_marks_configured_columns() {
        let sheets = setup_sheets(&session());
        assert_eq!(sheets.len(), 2);
        assert!(sheets[0].columns.iter().all(|c| c.checked));
        assert!(sheets[1].columns.iter().all(|c| !c.checked));
    }

    #[test]
    fn unfiltered_view_shows_everything() {
        let s = session();
        let sales = sheet_view(&s, 0).unwrap();
        assert_eq!(sales.total_rows, 4);
        assert_eq!(sales.active_filter_count, 0);
        assert_eq!(sales.filters.len(), 2);
        let labels: Vec<&str> = sales.filters[0].options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["East", "West"]);
        assert_eq!(sales.rows[3], vec!["".to_string(), "2024".to_string()]);

        let other = sheet_view(&s, 1).unwrap();
        assert_eq!(other.name, "Other");
        assert!(other.filters.is_empty());
    }

    #[test]
    fn later_filters_offer_narrowed_values() {
        let mut s = session();
        s.active_filter_values = BTreeMap::from([(
            "Sales".to_string(),
            BTreeMap::from([("Region".to_string(), vec![CellValue::text("West")])]),
        )]);

        let view = sheet_view(&s, 0).unwrap();
        assert_eq!(view.total_rows, 1);
        assert_eq!(view.active_filter_count, 1);
        assert!(view.filters[0].options.iter().any(|o| o.label == "West" && o.selected));

        let years: Vec<&str> = view.filters[1].options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(years, vec!["2023"]);
    }

    #[test]
    fn selected_value_stays_listed() {
        let mut s = session();
        s.active_filter_values = BTreeMap::from([(
            "Sales".to_string(),
            BTreeMap::from([
                ("Region".to_string(), vec![CellValue::text("West")]),
                ("Year".to_string(), vec![CellValue::Int(2024)]),
            ]),
        )]);

        let view = sheet_view(&s, 0).unwrap();
        assert_eq!(view.total_rows, 0);
        let year = &view.filters[1];
        assert!(year.options.iter().any(|o| o.label == "2024" && o.selected));
        assert_eq!(year.values_for(&[0, 1]).unwrap().len(), 2);
        assert!(matches!(
            year.values_for(&[0, 99]),
            Err(PortalError::InvalidFilterValue { option: 99, .. })
        ));
    }

    #[test]
    fn sheet_index_out_of_range() {
        assert!(matches!(sheet_view(&session(), 5), Err(PortalError::UnknownSheet(_))));
    }
}
