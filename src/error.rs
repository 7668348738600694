use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "xlsx")]
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] calamine::Error),

    #[cfg(feature = "xlsx")]
    #[error("Spreadsheet write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("No valid records to add after processing. Check the file for empty or malformed rows.")]
    NoValidRows,

    #[error("Invalid date '{0}'. Please use YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Start date {start} cannot be after end date {end}.")]
    InvalidRange { start: String, end: String },

    #[error("Invalid month '{0}'. Use 1-12 or a month name.")]
    InvalidMonth(String),

    #[error("Unsupported file type: {0}. Please select a CSV or Excel file.")]
    UnsupportedFile(String),

    #[error("{0}")]
    NoData(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SalesError>;
