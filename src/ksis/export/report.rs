use std::fmt;

/// Recoverable problems collected during a run and shown together at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A correction table could not be read; the run continued with an empty table.
    MissingCorrectionBackend { table: String, reason: String },
    /// No stored split and nobody to ask; the first token was taken as the last name.
    AmbiguousNameUnresolved { raw_form: String, fallback: String },
    /// A resolved name could not be saved; it is still used for this run.
    PersistenceWriteFailure { raw_form: String, reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingCorrectionBackend { table, reason } => {
                write!(f, "{table} corrections unavailable, starting empty ({reason})")
            }
            Warning::AmbiguousNameUnresolved { raw_form, fallback } => {
                write!(f, "name '{raw_form}' exported as '{fallback}', please review")
            }
            Warning::PersistenceWriteFailure { raw_form, reason } => {
                write!(f, "could not save correction for '{raw_form}': {reason}")
            }
        }
    }
}

/// End-of-run report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub competitions: usize,
    pub records: usize,
    pub complete_sessions: usize,
    pub live_sessions: usize,
    pub warnings: Vec<Warning>,
}

impl RunSummary {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} record(s) from {} competition(s), {} complete session(s)",
            self.records, self.competitions, self.complete_sessions
        )?;
        if self.live_sessions > 0 {
            write!(f, "\n{} session(s) still in progress", self.live_sessions)?;
        }
        if self.has_warnings() {
            write!(f, "\n{} warning(s):", self.warnings.len())?;
            for warning in &self.warnings {
                write!(f, "\n  - {warning}")?;
            }
        }
        Ok(())
    }
}
