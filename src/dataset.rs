use crate::cell::CellValue;
use crate::error::{PortalError, Result};

/// A named column of cell values
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }
}

/// Tabular data of one worksheet
///
/// All columns always hold the same number of values; constructors reject
/// anything else.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Create a dataset from columns that share one row count
    ///
    /// # Errors
    /// * `PortalError::ShapeMismatch` if a column is longer or shorter than the first one
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != row_count) {
            return Err(PortalError::ShapeMismatch {
                column: bad.name.clone(),
                expected: row_count,
                found: bad.values.len(),
            });
        }
        Ok(Dataset { columns, row_count })
    }

    /// Create a dataset from a header and row-major data
    ///
    /// Short rows are padded with `Empty`; cells beyond the header width are dropped.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let row_count = rows.len();
        let mut columns: Vec<Column> = header
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(row_count)))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.values.push(cells.next().unwrap_or(CellValue::Empty));
            }
        }

        let row_count = if columns.is_empty() { 0 } else { row_count };
        Dataset { columns, row_count }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in sheet order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Values of one row, in column order
    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// Iterate rows as vectors of cell references
    pub fn rows(&self) -> impl Iterator<Item = Vec<&CellValue>> + '_ {
        (0..self.row_count).map(move |r| self.columns.iter().map(|c| &c.values[r]).collect())
    }

    /// Keep only the rows at the given indices, in the order given
    pub fn take_rows(&self, indices: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), indices.iter().map(|&i| c.values[i].clone()).collect()))
            .collect();
        Dataset {
            columns,
            row_count: indices.len(),
        }
    }
}

/// One worksheet of a workbook
#[derive(Clone, Debug, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub data: Dataset,
}

/// A loaded spreadsheet file: its sheets in file order
#[derive(Clone, Debug, PartialEq)]
pub struct Workbook {
    pub file: String,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(file: impl Into<String>) -> Self {
        Workbook {
            file: file.into(),
            sheets: Vec::new(),
        }
    }

    /// Append a sheet, builder style
    pub fn with_sheet(mut self, name: impl Into<String>, data: Dataset) -> Self {
        self.sheets.push(Sheet {
            name: name.into(),
            data,
        });
        self
    }

    pub fn sheet(&self, name: &str) -> Option<&Dataset> {
        self.sheets.iter().find(|s| s.name == name).map(|s| &s.data)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_columns_are_rejected() {
        let result = Dataset::new(vec![
            Column::new("A", vec![1i64.into(), 2i64.into()]),
            Column::new("B", vec![1i64.into()]),
        ]);
        match result {
            Err(PortalError::ShapeMismatch { column, expected, found }) => {
                assert_eq!(column, "B");
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn from_rows_pads_short_rows() {
        let ds = Dataset::from_rows(
            vec!["A".into(), "B".into()],
            vec![vec!["x".into()], vec!["y".into(), 3i64.into(), "extra".into()]],
        );
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.column("B").unwrap().values, vec![CellValue::Empty, CellValue::Int(3)]);
        assert_eq!(ds.row(1).unwrap(), vec![&CellValue::text("y"), &CellValue::Int(3)]);
        assert!(ds.row(2).is_none());
    }

    #[test]
    fn take_rows_keeps_columns() {
        let ds = Dataset::from_rows(
            vec!["N".into()],
            (0..5).map(|i| vec![CellValue::Int(i)]).collect(),
        );
        let picked = ds.take_rows(&[1, 3]);
        assert_eq!(picked.column_names(), vec!["N"]);
        assert_eq!(picked.column("N").unwrap().values, vec![CellValue::Int(1), CellValue::Int(3)]);
    }

    #[test]
    fn workbook_keeps_sheet_order() {
        let wb = Workbook::new("data.xlsx")
            .with_sheet("Zeta", Dataset::default())
            .with_sheet("Alpha", Dataset::default());
        assert_eq!(wb.sheet_names(), vec!["Zeta", "Alpha"]);
        assert!(wb.sheet("Alpha").is_some());
        assert!(wb.sheet("Beta").is_none());
    }
}
