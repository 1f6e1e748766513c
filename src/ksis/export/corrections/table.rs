use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use crate::ksis::export::error::{ExportError, Result};
use crate::ksis::export::io::{excel_read, excel_write};
use crate::ksis::export::table::SheetTable;

/// Persistence for one two-column correction table.
pub trait CorrectionTable {
    /// Short label used in warnings and logs.
    fn describe(&self) -> String;

    fn read(&self) -> Result<Vec<(String, String)>>;

    /// Replaces the persisted table with `pairs`.
    fn write(&mut self, pairs: &[(String, String)]) -> Result<()>;
}

/// Correction table kept in an `.xlsx` workbook, header in the first row.
#[derive(Debug, Clone)]
pub struct XlsxTable {
    path: PathBuf,
    sheet_name: String,
    headers: [&'static str; 2],
}

impl XlsxTable {
    pub fn new(path: impl Into<PathBuf>, sheet_name: &str, headers: [&'static str; 2]) -> Self {
        Self {
            path: path.into(),
            sheet_name: sheet_name.to_string(),
            headers,
        }
    }

    /// Club corrections: `Raw club` → `Corrected club`.
    pub fn clubs(path: impl Into<PathBuf>) -> Self {
        Self::new(path, "Clubs", ["Raw club", "Corrected club"])
    }

    /// Name splits: `Raw name` → `Canonical name`.
    pub fn names(path: impl Into<PathBuf>) -> Self {
        Self::new(path, "Names", ["Raw name", "Canonical name"])
    }
}

impl CorrectionTable for XlsxTable {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<Vec<(String, String)>> {
        if !self.path.exists() {
            return Err(ExportError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", self.path.display()),
            )));
        }
        excel_read::read_pairs(&self.path)
    }

    fn write(&mut self, pairs: &[(String, String)]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let table = SheetTable::from_pairs(&self.sheet_name, self.headers, pairs);
        excel_write::replace_table(&self.path, &table)
    }
}

/// In-memory correction table. Clones share the same contents, so a test can
/// keep a handle and inspect what the store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    pairs: Rc<RefCell<Vec<(String, String)>>>,
    failing: bool,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        let pairs = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            pairs: Rc::new(RefCell::new(pairs)),
            failing: false,
        }
    }

    /// A table whose reads and writes always fail.
    pub fn failing() -> Self {
        Self {
            pairs: Rc::default(),
            failing: true,
        }
    }

    pub fn pairs(&self) -> Vec<(String, String)> {
        self.pairs.borrow().clone()
    }
}

impl CorrectionTable for MemoryTable {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn read(&self) -> Result<Vec<(String, String)>> {
        if self.failing {
            return Err(ExportError::InvalidWorkbook("memory table unavailable".into()));
        }
        Ok(self.pairs.borrow().clone())
    }

    fn write(&mut self, pairs: &[(String, String)]) -> Result<()> {
        if self.failing {
            return Err(ExportError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "memory table is read-only",
            )));
        }
        *self.pairs.borrow_mut() = pairs.to_vec();
        Ok(())
    }
}
