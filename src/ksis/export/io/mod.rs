pub mod csv_write;
pub mod excel_read;
pub mod excel_write;
pub mod html;
pub mod ksis;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::ksis::export::error::{ExportError, Result};
use crate::ksis::export::table::SheetTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Xlsx,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

/// File stem for an export: the competition name for a single competition,
/// `ksis-export` otherwise, followed by a minute-resolution timestamp.
pub fn export_stem(competition_names: &[&str], now: NaiveDateTime) -> String {
    let base = match competition_names {
        [single] => single.replace(['/', '\\'], "-"),
        _ => "ksis-export".to_string(),
    };
    format!("{base}-{}", now.format("%Y%m%d%H%M"))
}

/// Writes `table` into `dir` as `{stem}.{ext}` and returns the path.
pub fn write_export(dir: &Path, stem: &str, format: OutputFormat, table: &SheetTable) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(ExportError::MissingOutputDir(dir.to_path_buf()));
    }
    let path = dir.join(format!("{stem}.{}", format.extension()));
    match format {
        OutputFormat::Csv => csv_write::write_csv(&path, table)?,
        OutputFormat::Xlsx => excel_write::write_table(&path, table)?,
    }
    Ok(path)
}
