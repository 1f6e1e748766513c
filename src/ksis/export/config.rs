use std::path::PathBuf;
use std::time::Duration;

use crate::ksis::export::io::OutputFormat;

pub const DEFAULT_BASE_URL: &str = "https://ksis.eu";
pub const DEFAULT_DISCIPLINE: &str = "ARTW";
pub const DEFAULT_COUNTRY: &str = "CAN";
pub const DEFAULT_CORRECTIONS_DIR: &str = "corrections";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Resolved runtime settings, filled from the command line and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    /// Discipline code used by the listing page, e.g. `ARTW`.
    pub discipline: String,
    pub country: String,
    pub corrections_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    /// Never prompt; ambiguous names get the fallback split.
    pub batch: bool,
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            discipline: DEFAULT_DISCIPLINE.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            corrections_dir: PathBuf::from(DEFAULT_CORRECTIONS_DIR),
            output_dir: PathBuf::from("."),
            output_format: OutputFormat::Csv,
            batch: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
