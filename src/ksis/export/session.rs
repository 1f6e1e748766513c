use tracing::debug;

use crate::ksis::export::corrections::CorrectionStore;
use crate::ksis::export::model::{
    AthleteResult, Competition, RawRow, RawSession, Score, Session, SessionStatus,
};
use crate::ksis::export::normalize::{ClubNormalizer, Disambiguator, NameNormalizer};

/// Turns the raw rows of one session into canonical records.
pub struct SessionRecordBuilder<'a, D> {
    store: &'a mut CorrectionStore,
    names: &'a mut NameNormalizer<D>,
}

impl<'a, D: Disambiguator> SessionRecordBuilder<'a, D> {
    pub fn new(store: &'a mut CorrectionStore, names: &'a mut NameNormalizer<D>) -> Self {
        Self { store, names }
    }

    /// The session is live when the site says so or when any row has no
    /// score. An empty session is complete.
    pub fn build(&mut self, competition: &Competition, raw: RawSession) -> Session {
        let missing_scores = raw
            .rows
            .iter()
            .filter(|row| row.score.as_deref().and_then(Score::parse).is_none())
            .count();
        let status = if raw.in_progress || missing_scores > 0 {
            SessionStatus::Live
        } else {
            SessionStatus::Complete
        };
        debug!(
            session = %raw.name,
            rows = raw.rows.len(),
            missing_scores,
            in_progress = raw.in_progress,
            ?status,
            "classified session"
        );

        let records = raw
            .rows
            .into_iter()
            .map(|row| self.build_record(competition, &raw.name, row))
            .collect();

        Session {
            competition_id: competition.id.clone(),
            name: raw.name,
            status,
            records,
        }
    }

    fn build_record(&mut self, competition: &Competition, session: &str, row: RawRow) -> AthleteResult {
        let name = self.names.normalize(&row.name, self.store);
        let club = ClubNormalizer::new(self.store).normalize(&row.club);

        AthleteResult {
            competition: competition.name.clone(),
            competition_date: competition.date,
            session: session.to_string(),
            canonical_name: name.canonical,
            year_of_birth: row.year_of_birth.as_deref().and_then(parse_year),
            club,
            score: row.score.as_deref().and_then(Score::parse),
            extra_fields: row.extra,
            needs_review: name.needs_review,
        }
    }
}

fn parse_year(raw: &str) -> Option<u16> {
    match raw.trim().parse() {
        Ok(year) => Some(year),
        Err(error) => {
            debug!(raw, %error, "year of birth is not a number, exported as unknown");
            None
        }
    }
}
