use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Fatal failures. Anything that should not stop a run is reported as a
/// [`Warning`](crate::report::Warning) instead.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the CSV writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a correction workbook does not follow the two-column layout.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Transport-level failure from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The results site could not provide a competition. Aborts the whole
    /// aggregate so that no truncated export is written.
    #[error("competition {competition} is unavailable: {reason}")]
    UpstreamUnavailable { competition: String, reason: String },

    /// Raised when a page does not have the structure the parser expects.
    #[error("unexpected page structure: {0}")]
    Parse(String),

    /// Raised when a competition identifier is not a positive number.
    #[error("invalid competition id '{0}': expected a number")]
    InvalidCompetitionId(String),

    /// Raised when a date argument cannot be parsed.
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Raised when a date range ends before it starts.
    #[error("invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    /// Raised when the output directory does not exist.
    #[error("output directory not found: {0}")]
    MissingOutputDir(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
