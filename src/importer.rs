use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Result, SalesError};
use crate::models::{Batch, SalesRecord, REQUIRED_COLUMNS};

/// Rows shown in an import preview.
pub const PREVIEW_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

pub fn parse_number(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(any(feature = "xlsx", test))]
pub fn excel_serial_to_date(serial: f64) -> String {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    // Out-of-range serials keep their raw text and fail date parsing later.
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)
        .zip(serial.is_finite().then(|| chrono::TimeDelta::try_days(serial.floor() as i64)).flatten())
        .and_then(|(base, days)| base.checked_add_signed(days));
    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => serial.to_string(),
    }
}

fn text_field(raw: &str) -> Option<String> {
    let s = raw.trim();
    (!s.is_empty()).then(|| s.to_string())
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Convert a raw batch into typed records.
///
/// Fails without producing anything when a required column is absent. Rows with a
/// missing field, an unparseable date or number, or a negative quantity or unit
/// price are dropped and counted.
pub fn coerce_batch(batch: &Batch) -> Result<(Vec<SalesRecord>, usize)> {
    let missing = batch.missing_columns();
    if !missing.is_empty() {
        return Err(SalesError::MissingColumns(missing));
    }
    let idx: Vec<usize> = REQUIRED_COLUMNS
        .iter()
        .filter_map(|c| batch.column_index(c))
        .collect();

    let mut records = Vec::with_capacity(batch.len());
    let mut dropped = 0usize;
    for row in &batch.rows {
        let cell = |i: usize| row.get(idx[i]).map(String::as_str).unwrap_or("");
        match coerce_row([cell(0), cell(1), cell(2), cell(3), cell(4), cell(5)]) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }
    Ok((records, dropped))
}

fn coerce_row(cells: [&str; 6]) -> Option<SalesRecord> {
    let [date, branch, product, quantity, unit_price, total] = cells;
    let record = SalesRecord {
        date: parse_date(date)?,
        branch: text_field(branch)?,
        product: text_field(product)?,
        quantity: parse_number(quantity)?,
        unit_price: parse_number(unit_price)?,
        total: parse_number(total)?,
    };
    if record.quantity < 0.0 || record.unit_price < 0.0 {
        return None;
    }
    Some(record)
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

/// Read a CSV or spreadsheet into a raw batch, choosing the reader by extension.
pub fn read_batch(path: &Path) -> Result<Batch> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => read_csv_batch(path),
        "xlsx" | "xlsm" | "xls" | "ods" => read_spreadsheet_batch(path),
        _ => Err(SalesError::UnsupportedFile(path.display().to_string())),
    }
}

pub fn read_csv_batch(path: &Path) -> Result<Batch> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut batch = Batch::new(columns);
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        batch.rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(batch)
}

#[cfg(feature = "xlsx")]
fn read_spreadsheet_batch(path: &Path) -> Result<Batch> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SalesError::NoData(format!("{} has no worksheets", path.display())))??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Batch::default());
    };
    let mut batch = Batch::new(header.iter().map(cell_text).collect());
    for row in rows {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        batch.rows.push(cells);
    }
    Ok(batch)
}

#[cfg(not(feature = "xlsx"))]
fn read_spreadsheet_batch(_path: &Path) -> Result<Batch> {
    Err(SalesError::Other(
        "Excel import requires the 'xlsx' feature".into(),
    ))
}

#[cfg(feature = "xlsx")]
fn cell_text(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

pub struct Preview {
    pub columns: Vec<String>,
    pub head: Vec<Vec<String>>,
    pub total_rows: usize,
    pub missing: Vec<String>,
}

impl Preview {
    pub fn of(batch: &Batch) -> Self {
        Self {
            columns: batch.columns.clone(),
            head: batch.rows.iter().take(PREVIEW_ROWS).cloned().collect(),
            total_rows: batch.len(),
            missing: batch.missing_columns(),
        }
    }

    pub fn is_importable(&self) -> bool {
        self.missing.is_empty() && self.total_rows > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_date_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 1);
        assert_eq!(parse_date("2024-06-01"), d);
        assert_eq!(parse_date(" 2024/06/01 "), d);
        assert_eq!(parse_date("06/01/2024"), d);
        assert_eq!(parse_date("2024-06-01 13:45:00"), d);
        assert_eq!(parse_date("2024-06-01T08:00:00"), d);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("750"), Some(750.0));
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(45667.0), "2025-01-10");
        assert_eq!(excel_serial_to_date(45444.75), "2024-06-01");
        assert_eq!(excel_serial_to_date(1e300), 1e300.to_string());
        assert_eq!(excel_serial_to_date(1e15), "1000000000000000");
        assert!(parse_date(&excel_serial_to_date(1e15)).is_none());
    }

    #[test]
    fn test_read_csv_batch_keeps_extra_columns_and_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "in.csv",
            "Date,Branch,Product,Quantity,UnitPrice,Total,Cashier\n\
             2024-06-01,Colombo,Milk,5,150,750,Nimal\n\
             ,,,,,,\n\
             2024-06-02,Kandy,Bread,10,50,500,Sunil\n",
        );
        let batch = read_batch(&path).unwrap();
        assert_eq!(batch.columns.len(), 7);
        assert_eq!(batch.len(), 2);
        assert!(batch.missing_columns().is_empty());
    }

    #[test]
    fn test_coerce_batch_drops_invalid_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "in.csv",
            "Date,Branch,Product,Quantity,UnitPrice,Total\n\
             2024-06-01,Colombo,Milk,5,150,750\n\
             not-a-date,Colombo,Milk,5,150,750\n\
             2024-06-02,,Bread,10,50,500\n\
             2024-06-03,Kandy,Bread,ten,50,500\n\
             2024-06-04,Kandy,Bread,-1,50,500\n\
             2024-06-05,Kandy,Eggs,12,30\n",
        );
        let batch = read_batch(&path).unwrap();
        let (records, dropped) = coerce_batch(&batch).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(dropped, 5);
        assert_eq!(records[0].product, "Milk");
        assert_eq!(records[0].total, 750.0);
    }

    #[test]
    fn test_coerce_batch_accepts_unchecked_total() {
        let mut batch = Batch::new(REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect());
        batch.rows.push(
            ["2024-06-01", "Colombo", "Milk", "5", "150", "1"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let (records, dropped) = coerce_batch(&batch).unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(records[0].total, 1.0);
    }

    #[test]
    fn test_coerce_batch_missing_column() {
        let batch = Batch::new(
            ["Date", "Branch", "Product", "Quantity", "UnitPrice"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        match coerce_batch(&batch) {
            Err(SalesError::MissingColumns(cols)) => assert_eq!(cols, vec!["Total"]),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_read_batch_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "notes.txt", "hello");
        assert!(matches!(
            read_batch(&path),
            Err(SalesError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn test_preview_limits_rows() {
        let mut batch = Batch::new(vec!["Date".into(), "Branch".into()]);
        for i in 0..8 {
            batch.rows.push(vec![format!("2024-06-0{}", i + 1), "Colombo".into()]);
        }
        let preview = Preview::of(&batch);
        assert_eq!(preview.head.len(), PREVIEW_ROWS);
        assert_eq!(preview.total_rows, 8);
        assert_eq!(preview.missing, vec!["Product", "Quantity", "UnitPrice", "Total"]);
        assert!(!preview.is_importable());
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_read_xlsx_batch() {
        use rust_xlsxwriter::Workbook;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in REQUIRED_COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        sheet.write_string(1, 0, "2024-06-01").unwrap();
        sheet.write_string(1, 1, "Colombo").unwrap();
        sheet.write_string(1, 2, "Milk").unwrap();
        sheet.write_number(1, 3, 5.0).unwrap();
        sheet.write_number(1, 4, 150.0).unwrap();
        sheet.write_number(1, 5, 750.0).unwrap();
        workbook.save(&path).unwrap();

        let batch = read_batch(&path).unwrap();
        assert!(batch.missing_columns().is_empty());
        let (records, dropped) = coerce_batch(&batch).unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(records[0].quantity, 5.0);
    }
}
