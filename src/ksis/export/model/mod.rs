use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ksis::export::error::ExportError;

/// Numeric competition identifier used by the results site (`id_prop`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompetitionId(String);

impl CompetitionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CompetitionId {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(ExportError::InvalidCompetitionId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for CompetitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A competition as advertised by the listing or its results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    pub id: CompetitionId,
    pub name: String,
    /// `None` when the page carries no recognisable date.
    pub date: Option<NaiveDate>,
    pub is_live: bool,
}

impl Competition {
    pub fn new(id: CompetitionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            date: None,
            is_live: false,
        }
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    /// ISO date, or `Unknown` when the competition has none.
    pub fn date_label(&self) -> String {
        self.date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Column name → value pairs kept in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraFields(Vec<(String, String)>);

impl ExtraFields {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts or replaces a value; a replaced column keeps its position.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == column) {
            Some(entry) => entry.1 = value,
            None => self.0.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(column, _)| column.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtraFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = ExtraFields::new();
        for (column, value) in iter {
            fields.insert(column, value);
        }
        fields
    }
}

/// A score exactly as published. The numeric view is offered for callers
/// that need it; the text is what gets exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(String);

impl Score {
    /// Returns `None` for blank input: a blank cell is a missing score,
    /// whereas `0` is a real one.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decimal value, accepting a comma as decimal separator.
    pub fn value(&self) -> Option<f64> {
        self.0.replace(',', ".").parse().ok()
    }
}

/// One athlete row as handed over by the scraper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub name: String,
    pub year_of_birth: Option<String>,
    pub club: String,
    pub score: Option<String>,
    pub extra: ExtraFields,
}

impl RawRow {
    pub fn new(name: impl Into<String>, club: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            club: club.into(),
            ..Self::default()
        }
    }

    pub fn with_year_of_birth(mut self, year: impl Into<String>) -> Self {
        self.year_of_birth = Some(year.into());
        self
    }

    pub fn with_score(mut self, score: impl Into<String>) -> Self {
        self.score = Some(score.into());
        self
    }

    pub fn with_extra(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(column, value);
        self
    }
}

/// One results group of a competition as handed over by the scraper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSession {
    pub name: String,
    /// Set when the site reports the session as still running.
    pub in_progress: bool,
    pub rows: Vec<RawRow>,
}

impl RawSession {
    pub fn new(name: impl Into<String>, rows: Vec<RawRow>) -> Self {
        Self {
            name: name.into(),
            in_progress: false,
            rows,
        }
    }

    pub fn in_progress(mut self) -> Self {
        self.in_progress = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Complete,
    Live,
}

/// A canonical result row.
#[derive(Debug, Clone, PartialEq)]
pub struct AthleteResult {
    pub competition: String,
    pub competition_date: Option<NaiveDate>,
    pub session: String,
    /// Always "First Last" order.
    pub canonical_name: String,
    pub year_of_birth: Option<u16>,
    pub club: String,
    pub score: Option<Score>,
    pub extra_fields: ExtraFields,
    /// Set when the name split was guessed rather than resolved.
    pub needs_review: bool,
}

/// A session after normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub competition_id: CompetitionId,
    pub name: String,
    pub status: SessionStatus,
    pub records: Vec<AthleteResult>,
}

impl Session {
    pub fn is_live(&self) -> bool {
        self.status == SessionStatus::Live
    }
}
