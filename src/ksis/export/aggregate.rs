//! Merges sessions of one or more competitions into a single table.

use tracing::debug;

use crate::ksis::export::model::{AthleteResult, Competition, Session, SessionStatus};
use crate::ksis::export::table::SheetTable;

/// Columns every export starts with, before the per-competition extras.
pub const BASE_COLUMNS: [&str; 7] = ["Competition", "Session", "Name", "Club", "YOB", "Score", "Date"];

/// Accumulates records in arrival order. Nothing is sorted or deduplicated:
/// two rows with the same name are two athletes.
#[derive(Debug, Default)]
pub struct Aggregator {
    records: Vec<AthleteResult>,
    columns: Vec<String>,
    competitions: usize,
    complete: usize,
    live: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_session(&mut self, session: Session) {
        match session.status {
            SessionStatus::Complete => self.complete += 1,
            SessionStatus::Live => self.live += 1,
        }
        for record in &session.records {
            for column in record.extra_fields.columns() {
                if !self.columns.iter().any(|known| known == column) {
                    self.columns.push(column.to_string());
                }
            }
        }
        self.records.extend(session.records);
    }

    pub fn add_competition(&mut self, competition: &Competition, sessions: Vec<Session>) {
        debug!(competition = %competition.id, sessions = sessions.len(), "adding competition");
        self.competitions += 1;
        for session in sessions {
            self.add_session(session);
        }
    }

    pub fn finalize(self) -> AggregateTable {
        AggregateTable {
            records: self.records,
            columns: self.columns,
            competitions: self.competitions,
            complete_count: self.complete,
            live_count: self.live,
        }
    }
}

/// The finished aggregate: records plus the union of their extra columns in
/// first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTable {
    pub records: Vec<AthleteResult>,
    pub columns: Vec<String>,
    pub competitions: usize,
    pub complete_count: usize,
    pub live_count: usize,
}

impl AggregateTable {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn header(&self) -> Vec<String> {
        BASE_COLUMNS
            .iter()
            .map(|column| column.to_string())
            .chain(self.columns.iter().cloned())
            .collect()
    }

    /// Renders one record; extra columns the record lacks are empty cells.
    pub fn render_row(&self, record: &AthleteResult) -> Vec<String> {
        let mut row = vec![
            record.competition.clone(),
            record.session.clone(),
            record.canonical_name.clone(),
            record.club.clone(),
            record
                .year_of_birth
                .map(|year| year.to_string())
                .unwrap_or_default(),
            record
                .score
                .as_ref()
                .map(|score| score.as_str().to_string())
                .unwrap_or_default(),
            record
                .competition_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
        ];
        row.extend(
            self.columns
                .iter()
                .map(|column| record.extra_fields.get(column).unwrap_or_default().to_string()),
        );
        row
    }

    pub fn to_sheet(&self, sheet_name: &str) -> SheetTable {
        let mut table = SheetTable::new(sheet_name, self.header());
        table.rows = self
            .records
            .iter()
            .map(|record| self.render_row(record))
            .collect();
        table
    }

    /// Records whose name split was guessed.
    pub fn needs_review(&self) -> impl Iterator<Item = &AthleteResult> {
        self.records.iter().filter(|record| record.needs_review)
    }
}
