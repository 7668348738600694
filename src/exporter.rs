use std::path::{Path, PathBuf};

use chrono::Datelike;

use crate::error::{Result, SalesError};
use crate::outputs::{record_table, ReportOutput, Value};
use crate::models::SalesRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(SalesError::UnsupportedFile(path.display().to_string())),
        }
    }

    /// An explicit format wins; otherwise the output extension decides, then CSV.
    pub fn resolve(explicit: Option<Self>, output: Option<&Path>) -> Result<Self> {
        match (explicit, output) {
            (Some(f), _) => Ok(f),
            (None, Some(p)) if p.extension().is_some() => Self::from_path(p),
            _ => Ok(ExportFormat::Csv),
        }
    }
}

/// `<dir>/<name>-YYYY-MM-DD.<ext>` next to the data file.
pub fn default_path(data_file: &Path, name: &str, format: ExportFormat) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d");
    data_file
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("exports")
        .join(format!("{name}-{date}.{}", format.extension()))
}

/// Dataset rows after filtering, in any format.
pub fn export_records(
    records: &[SalesRecord],
    subtitle: &str,
    format: ExportFormat,
    path: &Path,
    currency: &str,
) -> Result<()> {
    let (headers, rows) = record_table(records);
    match format {
        ExportFormat::Csv => write_csv(path, &headers, &rows, Value::exact)?,
        ExportFormat::Xlsx => write_xlsx(path, "Sales Data", &headers, &rows, &[])?,
        ExportFormat::Pdf => {
            let bytes = render_records_pdf(subtitle, &headers, &rows, currency)?;
            write_bytes(path, &bytes)?;
        }
    }
    tracing::info!(path = %path.display(), rows = rows.len(), ?format, "exported records");
    Ok(())
}

/// The current report's table (plus summary lines for XLSX and PDF).
pub fn export_report(report: &ReportOutput, format: ExportFormat, path: &Path, currency: &str) -> Result<()> {
    if report.is_empty() {
        return Err(SalesError::NoData(
            "Generate a report first before exporting.".to_string(),
        ));
    }
    match format {
        ExportFormat::Csv => write_csv(path, &report.headers, &report.rows, Value::raw)?,
        ExportFormat::Xlsx => write_xlsx(path, &report.title, &report.headers, &report.rows, &report.summary)?,
        ExportFormat::Pdf => {
            let bytes = render_report_pdf(report, currency)?;
            write_bytes(path, &bytes)?;
        }
    }
    tracing::info!(path = %path.display(), title = %report.title, ?format, "exported report");
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn write_csv(path: &Path, headers: &[String], rows: &[Vec<Value>], cell: fn(&Value) -> String) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(row.iter().map(cell))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(feature = "xlsx")]
fn write_xlsx(
    path: &Path,
    sheet: &str,
    headers: &[String],
    rows: &[Vec<Value>],
    summary: &[(String, Value)],
) -> Result<()> {
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    ensure_parent(path)?;
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");
    let date = Format::new().set_num_format("yyyy-mm-dd");

    let ws = workbook.add_worksheet();
    // Sheet names are limited to 31 characters.
    ws.set_name(sheet.chars().take(31).collect::<String>())?;
    for (c, h) in headers.iter().enumerate() {
        ws.write_string_with_format(0, c as u16, h, &bold)?;
    }
    for (r, row) in rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (c, value) in row.iter().enumerate() {
            let c = c as u16;
            match value {
                Value::Text(s) => {
                    ws.write_string(r, c, s)?;
                }
                Value::Date(d) => {
                    // Excel dates start at 1900; earlier ones are written as text.
                    let dt = if (1900..=9999).contains(&d.year()) {
                        ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8).ok()
                    } else {
                        None
                    };
                    match dt {
                        Some(dt) => ws.write_datetime_with_format(r, c, &dt, &date)?,
                        None => ws.write_string(r, c, value.raw())?,
                    };
                }
                Value::Money(m) => {
                    ws.write_number_with_format(r, c, *m, &money)?;
                }
                Value::Quantity(q) => {
                    ws.write_number(r, c, *q)?;
                }
                Value::Count(n) => {
                    ws.write_number(r, c, *n as f64)?;
                }
            }
        }
    }

    let mut r = rows.len() as u32 + 2;
    for (label, value) in summary {
        ws.write_string_with_format(r, 0, label, &bold)?;
        match value.as_f64() {
            Some(v) => ws.write_number_with_format(r, 1, v, &money)?,
            None => ws.write_string(r, 1, value.raw())?,
        };
        r += 1;
    }
    ws.autofit();
    workbook.save(path)?;
    Ok(())
}

#[cfg(not(feature = "xlsx"))]
fn write_xlsx(_: &Path, _: &str, _: &[String], _: &[Vec<Value>], _: &[(String, Value)]) -> Result<()> {
    Err(SalesError::Other(
        "Excel export requires the 'xlsx' feature.".to_string(),
    ))
}

#[cfg(feature = "pdf")]
fn render_report_pdf(report: &ReportOutput, currency: &str) -> Result<Vec<u8>> {
    crate::pdf::render_report(report, currency)
}

#[cfg(feature = "pdf")]
fn render_records_pdf(subtitle: &str, headers: &[String], rows: &[Vec<Value>], currency: &str) -> Result<Vec<u8>> {
    crate::pdf::render_records("Sales Data", subtitle, headers, rows, currency)
}

#[cfg(not(feature = "pdf"))]
fn render_report_pdf(_: &ReportOutput, _: &str) -> Result<Vec<u8>> {
    Err(SalesError::Pdf("PDF export requires the 'pdf' feature.".to_string()))
}

#[cfg(not(feature = "pdf"))]
fn render_records_pdf(_: &str, _: &[String], _: &[Vec<Value>], _: &str) -> Result<Vec<u8>> {
    Err(SalesError::Pdf("PDF export requires the 'pdf' feature.".to_string()))
}
