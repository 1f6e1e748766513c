use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::ksis::export::aggregate::{AggregateTable, Aggregator};
use crate::ksis::export::corrections::CorrectionStore;
use crate::ksis::export::error::Result;
use crate::ksis::export::model::{Competition, CompetitionId, RawSession, Session};
use crate::ksis::export::normalize::{Disambiguator, NameNormalizer};
use crate::ksis::export::report::RunSummary;
use crate::ksis::export::session::SessionRecordBuilder;
use crate::ksis::export::source::{ListingFilter, ResultsSource};

/// Result of a successful export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    pub competitions: Vec<Competition>,
    pub table: AggregateTable,
    pub summary: RunSummary,
}

/// Drives sources, normalizers and the aggregator. Name resolutions are
/// shared by every export made through the same exporter.
pub struct Exporter<'a, S, D> {
    source: &'a S,
    store: &'a mut CorrectionStore,
    names: NameNormalizer<D>,
}

impl<'a, S: ResultsSource, D: Disambiguator> Exporter<'a, S, D> {
    pub fn new(source: &'a S, store: &'a mut CorrectionStore, disambiguator: D) -> Self {
        Self {
            source,
            store,
            names: NameNormalizer::new(disambiguator),
        }
    }

    /// Exports the given competitions in the order given. Repeated ids are
    /// exported once.
    #[instrument(level = "info", skip_all, fields(count = ids.len()))]
    pub fn export_ids(&mut self, ids: &[CompetitionId]) -> Result<ExportOutcome> {
        let mut competitions: Vec<Competition> = Vec::with_capacity(ids.len());
        for id in ids {
            if competitions.iter().any(|known| &known.id == id) {
                debug!(competition = %id, "skipping repeated id");
                continue;
            }
            competitions.push(self.source.fetch_competition(id)?);
        }
        self.export(competitions)
    }

    /// Exports every listed competition dated within `from..=to`, oldest
    /// first. Competitions without a date are left out.
    ///
    /// Dates are only known from each competition's own page, so every listed
    /// competition is fetched first. Any one that cannot be fetched aborts the
    /// run, even if it would have fallen outside the range.
    #[instrument(level = "info", skip_all, fields(from = %from, to = %to))]
    pub fn export_date_range(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
        filter: &ListingFilter,
    ) -> Result<ExportOutcome> {
        let listed = filter.apply(self.source.list_competitions()?);

        let mut selected = Vec::new();
        for entry in listed {
            let mut competition = self.source.fetch_competition(&entry.id)?;
            competition.is_live = competition.is_live || entry.is_live;
            match competition.date {
                Some(date) if date >= from && date <= to => selected.push(competition),
                Some(_) => {}
                None => debug!(competition = %competition.id, "skipping competition without a date"),
            }
        }
        selected.sort_by_key(|competition| competition.date);
        info!(selected = selected.len(), "competitions in range");

        self.export(selected)
    }

    /// Fetches and aggregates the competitions. Any upstream failure aborts
    /// the whole run and nothing already aggregated is returned.
    fn export(&mut self, competitions: Vec<Competition>) -> Result<ExportOutcome> {
        let mut aggregator = Aggregator::new();
        for competition in &competitions {
            info!(competition = %competition.id, name = %competition.name, "exporting");
            let raw_sessions = self.source.fetch_sessions(competition)?;
            let sessions = self.build_sessions(competition, raw_sessions);
            aggregator.add_competition(competition, sessions);
        }

        let table = aggregator.finalize();
        let mut warnings = self.store.take_warnings();
        warnings.extend(self.names.take_warnings());
        let summary = RunSummary {
            competitions: competitions.len(),
            records: table.records.len(),
            complete_sessions: table.complete_count,
            live_sessions: table.live_count,
            warnings,
        };
        info!(
            records = summary.records,
            complete = summary.complete_sessions,
            live = summary.live_sessions,
            "export finished"
        );

        Ok(ExportOutcome {
            competitions,
            table,
            summary,
        })
    }

    /// Normalises the raw sessions of one competition.
    pub fn build_sessions(&mut self, competition: &Competition, raw_sessions: Vec<RawSession>) -> Vec<Session> {
        let mut builder = SessionRecordBuilder::new(self.store, &mut self.names);
        raw_sessions
            .into_iter()
            .map(|raw| {
                let session = builder.build(competition, raw);
                if session.is_live() {
                    warn!(
                        session = %session.name,
                        athletes = session.records.len(),
                        "session still in progress"
                    );
                } else {
                    info!(session = %session.name, athletes = session.records.len(), "session complete");
                }
                session
            })
            .collect()
    }
}
