#![allow(dead_code)]

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Regions of the ten Sheet1 rows; four of them are "East"
pub const REGIONS: [&str; 10] = [
    "East", "West", "East", "North", "East", "South", "West", "East", "North", "South",
];

/// Write `data.xlsx` into `dir`:
///
/// * `Sheet1` - Region, Sales, Date (10 rows)
/// * `Sheet2` - Name (5 rows)
///
/// plus a `~lock.xlsx` lock file and an unrelated text file.
pub fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("data.xlsx");
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let sheet1 = workbook.add_worksheet();
    sheet1.set_name("Sheet1").unwrap();
    sheet1.write_string(0, 0, "Region").unwrap();
    sheet1.write_string(0, 1, "Sales").unwrap();
    sheet1.write_string(0, 2, "Date").unwrap();
    for (i, region) in REGIONS.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet1.write_string(row, 0, *region).unwrap();
        sheet1.write_number(row, 1, (row * 100) as f64).unwrap();
        let date = ExcelDateTime::from_ymd(2024, 1, (i + 1) as u8).unwrap();
        sheet1.write_datetime_with_format(row, 2, &date, &date_format).unwrap();
    }

    let sheet2 = workbook.add_worksheet();
    sheet2.set_name("Sheet2").unwrap();
    sheet2.write_string(0, 0, "Name").unwrap();
    for i in 0..5u32 {
        sheet2.write_string(i + 1, 0, &format!("name-{}", i)).unwrap();
    }

    workbook.save(&path).unwrap();

    File::create(dir.join("~lock.xlsx")).unwrap();
    File::create(dir.join("notes.txt")).unwrap();
    path
}
