//! Filter configuration and filter application.
//!
//! A filter restricts one column of one sheet to a set of admissible values.
//! Several filters on the same sheet combine with AND: each one narrows the
//! rows left by the previous one, so the order they are applied in does not
//! change the result.

use crate::cell::CellValue;
use crate::dataset::Dataset;
use crate::error::{PortalError, Result};
use std::collections::{BTreeMap, HashSet};

/// Per-sheet list of the columns the user chose to filter by
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterConfig {
    columns: BTreeMap<String, Vec<String>>,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the filter columns of one sheet
    ///
    /// Every column must exist in `dataset`. Duplicates are collapsed and the
    /// first-seen order is kept. An empty list removes the sheet's entry.
    ///
    /// # Errors
    /// * `PortalError::InvalidFilterColumn` naming the first unknown column;
    ///   the store is left untouched in that case
    pub fn set_filter_columns(&mut self, sheet: &str, dataset: &Dataset, columns: &[String]) -> Result<()> {
        let mut ordered: Vec<String> = Vec::with_capacity(columns.len());
        for column in columns {
            if !dataset.has_column(column) {
                return Err(PortalError::InvalidFilterColumn {
                    sheet: sheet.to_string(),
                    column: column.clone(),
                });
            }
            if !ordered.contains(column) {
                ordered.push(column.clone());
            }
        }

        if ordered.is_empty() {
            self.columns.remove(sheet);
        } else {
            self.columns.insert(sheet.to_string(), ordered);
        }
        Ok(())
    }

    /// Drop every configured column (the "show all data" choice)
    pub fn clear(&mut self) {
        self.columns.clear();
    }

    /// Configured columns of a sheet, empty if none
    pub fn columns(&self, sheet: &str) -> &[String] {
        self.columns.get(sheet).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_filter_column(&self, sheet: &str, column: &str) -> bool {
        self.columns(sheet).iter().any(|c| c == column)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Sheets that have at least one filter column
    pub fn sheets(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

/// Keep the rows whose value in `column` is one of `selected`
///
/// An empty selection restricts nothing and returns the dataset as is.
/// Missing values (blank or error cells) never match. Row order is kept.
///
/// # Errors
/// * `PortalError::InvalidFilterColumn` if the selection is non-empty and the
///   dataset has no such column
pub fn apply(dataset: &Dataset, column: &str, selected: &[CellValue]) -> Result<Dataset> {
    if selected.is_empty() {
        return Ok(dataset.clone());
    }
    let keep = matching_rows(dataset, &[(column, selected)], "")?;
    Ok(dataset.take_rows(&keep))
}

/// Apply several filters at once (logical AND)
///
/// `sheet` is only used to name the sheet in errors.
pub fn apply_all(dataset: &Dataset, sheet: &str, filters: &[(&str, &[CellValue])]) -> Result<Dataset> {
    let active: Vec<(&str, &[CellValue])> = filters.iter().filter(|(_, v)| !v.is_empty()).copied().collect();
    if active.is_empty() {
        return Ok(dataset.clone());
    }
    let keep = matching_rows(dataset, &active, sheet)?;
    Ok(dataset.take_rows(&keep))
}

fn matching_rows(dataset: &Dataset, filters: &[(&str, &[CellValue])], sheet: &str) -> Result<Vec<usize>> {
    let mut predicates = Vec::with_capacity(filters.len());
    for (column, selected) in filters {
        let col = dataset.column(column).ok_or_else(|| PortalError::InvalidFilterColumn {
            sheet: sheet.to_string(),
            column: column.to_string(),
        })?;
        let wanted: HashSet<&CellValue> = selected.iter().filter(|v| !v.is_missing()).collect();
        predicates.push((&col.values, wanted));
    }

    Ok((0..dataset.row_count())
        .filter(|&row| {
            predicates.iter().all(|(values, wanted)| {
                let value = &values[row];
                !value.is_missing() && wanted.contains(value)
            })
        })
        .collect())
}

/// Distinct non-missing values of a column, in order of first appearance
///
/// Returns an empty list for an unknown column.
pub fn unique_values(dataset: &Dataset, column: &str) -> Vec<CellValue> {
    let Some(col) = dataset.column(column) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    col.values
        .iter()
        .filter(|v| !v.is_missing())
        .filter(|v| seen.insert(*v))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::new(
                "Region",
                vec!["East".into(), "West".into(), CellValue::Empty, "East".into(), "North".into()],
            ),
            Column::new("Year", vec![2023i64.into(), 2024i64.into(), 2024i64.into(), 2024i64.into(), 2023i64.into()]),
            Column::new("Id", (1..=5).map(|i| CellValue::Int(i)).collect()),
        ])
        .unwrap()
    }

    fn ids(ds: &Dataset) -> Vec<i64> {
        ds.column("Id")
            .unwrap()
            .values
            .iter()
            .map(|v| match v {
                CellValue::Int(i) => *i,
                other => panic!("unexpected id {:?}", other),
            })
            .collect()
    }

    #[test]
    fn empty_selection_is_identity() {
        let ds = sample();
        assert_eq!(apply(&ds, "Region", &[]).unwrap(), ds);
        // even for a column that does not exist
        assert_eq!(apply(&ds, "Nope", &[]).unwrap(), ds);
    }

    #[test]
    fn selection_is_stable_and_complete() {
        let ds = sample();
        let out = apply(&ds, "Region", &["East".into(), "North".into()]).unwrap();
        assert_eq!(ids(&out), vec![1, 4, 5]);
        assert_eq!(out.column_names(), ds.column_names());
    }

    #[test]
    fn missing_values_never_match() {
        let ds = sample();
        let out = apply(&ds, "Region", &[CellValue::Empty]).unwrap();
        assert_eq!(out.row_count(), 0);

        let blanks = Dataset::new(vec![Column::new("Region", vec![CellValue::text(""), "East".into()])]).unwrap();
        assert_eq!(apply(&blanks, "Region", &[CellValue::text("")]).unwrap().row_count(), 0);
        assert_eq!(unique_values(&blanks, "Region"), vec![CellValue::text("East")]);
    }

    #[test]
    fn value_outside_column_gives_no_rows() {
        let ds = sample();
        let out = apply(&ds, "Region", &["South".into()]).unwrap();
        assert_eq!(out.row_count(), 0);
        assert_eq!(out.column_count(), 3);
    }

    #[test]
    fn unknown_column_with_values_fails() {
        let ds = sample();
        let err = apply(&ds, "Nope", &["East".into()]).unwrap_err();
        assert!(matches!(err, PortalError::InvalidFilterColumn { ref column, .. } if column == "Nope"));
    }

    #[test]
    fn chained_filters_commute() {
        let ds = sample();
        let regions: Vec<CellValue> = vec!["East".into(), "West".into()];
        let years: Vec<CellValue> = vec![2024i64.into()];

        let a = apply(&apply(&ds, "Region", &regions).unwrap(), "Year", &years).unwrap();
        let b = apply(&apply(&ds, "Year", &years).unwrap(), "Region", &regions).unwrap();
        let c = apply_all(&ds, "Sheet1", &[("Region", &regions[..]), ("Year", &years[..])]).unwrap();

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(ids(&a), vec![2, 4]);
    }

    #[test]
    fn apply_all_skips_empty_selections() {
        let ds = sample();
        let none: Vec<CellValue> = Vec::new();
        let years: Vec<CellValue> = vec![2023i64.into()];
        let out = apply_all(&ds, "Sheet1", &[("Region", &none[..]), ("Year", &years[..])]).unwrap();
        assert_eq!(ids(&out), vec![1, 5]);
    }

    #[test]
    fn unique_values_in_first_seen_order() {
        let ds = sample();
        assert_eq!(
            unique_values(&ds, "Region"),
            vec![CellValue::text("East"), CellValue::text("West"), CellValue::text("North")]
        );
        assert!(unique_values(&ds, "Nope").is_empty());
    }

    #[test]
    fn store_validates_and_replaces() {
        let ds = sample();
        let mut config = FilterConfig::new();

        config
            .set_filter_columns("Sheet1", &ds, &["Region".into(), "Year".into(), "Region".into()])
            .unwrap();
        assert_eq!(config.columns("Sheet1"), ["Region", "Year"]);
        assert!(config.is_filter_column("Sheet1", "Year"));

        let err = config
            .set_filter_columns("Sheet1", &ds, &["Year".into(), "Missing".into()])
            .unwrap_err();
        assert!(matches!(err, PortalError::InvalidFilterColumn { .. }));
        // failed call leaves the previous configuration in place
        assert_eq!(config.columns("Sheet1"), ["Region", "Year"]);

        config.set_filter_columns("Sheet1", &ds, &["Id".into()]).unwrap();
        assert_eq!(config.columns("Sheet1"), ["Id"]);

        config.set_filter_columns("Sheet1", &ds, &[]).unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn clear_empties_everything() {
        let ds = sample();
        let mut config = FilterConfig::new();
        config.set_filter_columns("A", &ds, &["Region".into()]).unwrap();
        config.set_filter_columns("B", &ds, &["Year".into()]).unwrap();
        config.clear();
        assert!(config.is_empty());
        assert!(config.columns("A").is_empty());
    }
}
