//! Persisted club and name corrections.
//!
//! Both tables are owned by a single [`CorrectionStore`] for the whole run and
//! are borrowed by the normalizers, so a name resolved in one session is seen
//! by every session that follows. Corrections are never required: a table that
//! cannot be read starts out empty and the problem is reported as a
//! [`Warning`].

pub mod table;

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::ksis::export::error::ExportError;
use crate::ksis::export::normalize::collapse_whitespace;
use crate::ksis::export::report::Warning;

pub use table::{CorrectionTable, MemoryTable, XlsxTable};

pub const CLUB_CORRECTIONS_FILE: &str = "club_corrections.xlsx";
pub const NAME_CORRECTIONS_FILE: &str = "name_corrections.xlsx";

/// Ordered key → value mapping with O(1) lookup.
#[derive(Debug, Default)]
struct Corrections {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Corrections {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut corrections = Self::default();
        for (key, value) in pairs {
            corrections.upsert(collapse_whitespace(&key), value);
        }
        corrections
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&position| self.entries[position].1.as_str())
    }

    /// Returns `false` when the key already mapped to `value`.
    fn upsert(&mut self, key: String, value: String) -> bool {
        match self.index.get(&key) {
            Some(&position) if self.entries[position].1 == value => false,
            Some(&position) => {
                self.entries[position].1 = value;
                true
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                true
            }
        }
    }
}

pub struct CorrectionStore {
    clubs: Corrections,
    names: Corrections,
    club_table: Box<dyn CorrectionTable>,
    name_table: Box<dyn CorrectionTable>,
    /// False when the name table exists but could not be read. It is then
    /// never written during the run.
    names_writable: bool,
    warnings: Vec<Warning>,
}

impl CorrectionStore {
    /// Creates an empty store over the given backends. Call [`load`](Self::load)
    /// to populate it.
    pub fn new(club_table: impl CorrectionTable + 'static, name_table: impl CorrectionTable + 'static) -> Self {
        Self {
            clubs: Corrections::default(),
            names: Corrections::default(),
            club_table: Box::new(club_table),
            name_table: Box::new(name_table),
            names_writable: true,
            warnings: Vec::new(),
        }
    }

    /// Store backed by the two correction workbooks inside `dir`.
    pub fn open_dir(dir: &Path) -> Self {
        let mut store = Self::new(
            XlsxTable::clubs(dir.join(CLUB_CORRECTIONS_FILE)),
            XlsxTable::names(dir.join(NAME_CORRECTIONS_FILE)),
        );
        store.load();
        store
    }

    /// Store with no persistence beyond the process.
    pub fn in_memory() -> Self {
        Self::new(MemoryTable::new(), MemoryTable::new())
    }

    /// (Re)reads both tables. Unreadable tables are replaced by empty ones.
    pub fn load(&mut self) {
        self.clubs = self.read_table(TableKind::Clubs).into_corrections();
        let names = self.read_table(TableKind::Names);
        self.names_writable = !matches!(names, TableRead::Unreadable);
        self.names = names.into_corrections();
        info!(
            clubs = self.clubs.entries.len(),
            names = self.names.entries.len(),
            "corrections loaded"
        );
    }

    fn read_table(&mut self, kind: TableKind) -> TableRead {
        let backend = match kind {
            TableKind::Clubs => &self.club_table,
            TableKind::Names => &self.name_table,
        };
        match backend.read() {
            Ok(pairs) => TableRead::Loaded(Corrections::from_pairs(pairs)),
            Err(error) => {
                warn!(table = kind.label(), source = %backend.describe(), %error, "correction table unavailable");
                self.warnings.push(Warning::MissingCorrectionBackend {
                    table: kind.label().to_string(),
                    reason: error.to_string(),
                });
                if is_not_found(&error) {
                    TableRead::Missing
                } else {
                    TableRead::Unreadable
                }
            }
        }
    }

    pub fn lookup_name(&self, raw_form: &str) -> Option<&str> {
        self.names.get(&collapse_whitespace(raw_form))
    }

    pub fn lookup_club(&self, raw_name: &str) -> Option<&str> {
        self.clubs.get(&collapse_whitespace(raw_name))
    }

    /// Stores a resolved split and persists the name table before returning.
    ///
    /// Recording the same pair twice is a no-op. When the table cannot be
    /// written, or could not be read by [`load`](Self::load) and so must not be
    /// overwritten, the correction still applies for the rest of the run and a
    /// [`Warning::PersistenceWriteFailure`] is queued.
    pub fn record_name_correction(&mut self, raw_form: &str, canonical_form: &str) {
        let key = collapse_whitespace(raw_form);
        if !self.names.upsert(key.clone(), canonical_form.to_string()) {
            return;
        }

        if !self.names_writable {
            let reason = format!(
                "{} could not be read earlier and is left untouched",
                self.name_table.describe()
            );
            warn!(raw_form = %key, %reason, "name correction kept in memory only");
            self.warnings.push(Warning::PersistenceWriteFailure { raw_form: key, reason });
            return;
        }

        match self.name_table.write(&self.names.entries) {
            Ok(()) => debug!(raw_form = %key, canonical_form, "name correction saved"),
            Err(error) => {
                warn!(raw_form = %key, %error, "failed to persist name correction");
                self.warnings.push(Warning::PersistenceWriteFailure {
                    raw_form: key,
                    reason: error.to_string(),
                });
            }
        }
    }

    pub fn name_corrections(&self) -> &[(String, String)] {
        &self.names.entries
    }

    pub fn club_corrections(&self) -> &[(String, String)] {
        &self.clubs.entries
    }

    /// Drains the warnings queued since the last call.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}

enum TableRead {
    Loaded(Corrections),
    Missing,
    /// The backend exists but its content could not be read.
    Unreadable,
}

impl TableRead {
    fn into_corrections(self) -> Corrections {
        match self {
            TableRead::Loaded(corrections) => corrections,
            TableRead::Missing | TableRead::Unreadable => Corrections::default(),
        }
    }
}

fn is_not_found(error: &ExportError) -> bool {
    matches!(error, ExportError::Io(io_error) if io_error.kind() == std::io::ErrorKind::NotFound)
}

#[derive(Clone, Copy)]
enum TableKind {
    Clubs,
    Names,
}

impl TableKind {
    fn label(self) -> &'static str {
        match self {
            TableKind::Clubs => "club",
            TableKind::Names => "name",
        }
    }
}
