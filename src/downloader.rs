use crate::cell::CellValue;
use crate::dataset::Dataset;
use rust_xlsxwriter::{Workbook, XlsxError};

/// Convert a dataset to CSV format
///
/// The first line holds the column names. Fields containing commas, quotes
/// or line breaks are quoted, with embedded quotes doubled.
///
/// # Arguments
/// * `dataset` - The (usually filtered) sheet to export
///
/// # Returns
/// * `String` - CSV content
///
/// # Examples
/// ```
/// use research_portal::dataset::{Column, Dataset};
/// use research_portal::downloader::to_csv;
///
/// let ds = Dataset::new(vec![Column::new("Region", vec!["East".into()])]).unwrap();
/// assert_eq!(to_csv(&ds), "Region\nEast\n");
/// ```
pub fn to_csv(dataset: &Dataset) -> String {
    let mut csv_content = String::new();

    push_csv_line(&mut csv_content, dataset.column_names().into_iter().map(str::to_string));
    for row in dataset.rows() {
        push_csv_line(&mut csv_content, row.into_iter().map(|v| v.to_string()));
    }

    csv_content
}

fn push_csv_line(out: &mut String, fields: impl Iterator<Item = String>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(&field);
        }
    }
    out.push('\n');
}

/// Convert a dataset to XLSX format
///
/// Writes one worksheet named after the sheet, header row first. Numbers and
/// booleans keep their type; dates are written as text in ISO form.
///
/// # Arguments
/// * `sheet_name` - Name for the worksheet
/// * `dataset` - The (usually filtered) sheet to export
///
/// # Returns
/// * `Result<Vec<u8>, XlsxError>` - XLSX file content as bytes or an error
pub fn to_xlsx(sheet_name: &str, dataset: &Dataset) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&worksheet_name(sheet_name))?;

    for (c, name) in dataset.column_names().into_iter().enumerate() {
        worksheet.write_string(0, c as u16, name)?;
    }

    for (r, row) in dataset.rows().enumerate() {
        let r = (r + 1) as u32;
        for (c, value) in row.into_iter().enumerate() {
            let c = c as u16;
            match value {
                CellValue::Empty => {}
                CellValue::Int(i) => {
                    worksheet.write_number(r, c, *i as f64)?;
                }
                CellValue::Float(f) => {
                    worksheet.write_number(r, c, *f)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
                other => {
                    worksheet.write_string(r, c, &other.to_string())?;
                }
            }
        }
    }

    workbook.save_to_buffer()
}

/// Excel limits sheet names to 31 characters and bans a few symbols
fn worksheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| match ch {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(31)
        .collect();
    let cleaned = cleaned.trim_matches('\'').to_string();
    if cleaned.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}
