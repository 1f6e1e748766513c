use std::cell::RefCell;
use std::collections::HashMap;

use chrono::NaiveDate;
use ksis_export::aggregate::{Aggregator, BASE_COLUMNS};
use ksis_export::corrections::{CorrectionStore, MemoryTable};
use ksis_export::error::{ExportError, Result};
use ksis_export::export::Exporter;
use ksis_export::model::{Competition, CompetitionId, RawRow, RawSession, SessionStatus};
use ksis_export::normalize::{NameNormalizer, Unavailable, from_fn};
use ksis_export::session::SessionRecordBuilder;
use ksis_export::source::{ListingFilter, ResultsSource};

fn id(value: &str) -> CompetitionId {
    value.parse().expect("numeric id")
}

fn competition(value: &str, name: &str, date: Option<(i32, u32, u32)>) -> Competition {
    Competition::new(id(value), name)
        .with_date(date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)))
}

fn scored(name: &str, score: &str) -> RawRow {
    RawRow::new(name, "Gymnix").with_score(score)
}

/// Serves canned competitions; ids listed in `failing` are unreachable.
#[derive(Default)]
struct FakeSource {
    listing: Vec<Competition>,
    sessions: HashMap<CompetitionId, Vec<RawSession>>,
    failing: Vec<CompetitionId>,
    fetched: RefCell<Vec<CompetitionId>>,
}

impl FakeSource {
    fn with(mut self, competition: Competition, sessions: Vec<RawSession>) -> Self {
        self.sessions.insert(competition.id.clone(), sessions);
        self.listing.push(competition);
        self
    }
}

impl ResultsSource for FakeSource {
    fn list_competitions(&self) -> Result<Vec<Competition>> {
        Ok(self.listing.clone())
    }

    fn fetch_competition(&self, id: &CompetitionId) -> Result<Competition> {
        self.listing
            .iter()
            .find(|competition| &competition.id == id)
            .cloned()
            .ok_or_else(|| ExportError::UpstreamUnavailable {
                competition: id.to_string(),
                reason: "not found".into(),
            })
    }

    fn fetch_sessions(&self, competition: &Competition) -> Result<Vec<RawSession>> {
        self.fetched.borrow_mut().push(competition.id.clone());
        if self.failing.contains(&competition.id) {
            return Err(ExportError::UpstreamUnavailable {
                competition: competition.id.to_string(),
                reason: "connection reset".into(),
            });
        }
        Ok(self.sessions.get(&competition.id).cloned().unwrap_or_default())
    }
}

#[test]
fn end_to_end_example_row() {
    let mut store = CorrectionStore::new(
        MemoryTable::with_pairs([("Club de gymnastique Les Sittelles ON", "Les Sittelles")]),
        MemoryTable::new(),
    );
    store.load();
    let mut names = NameNormalizer::new(from_fn(|_raw: &str, _tokens: &[&str]| Some(3)));
    let meet = competition("8819", "Provincial Cup", Some((2025, 3, 8)));
    let raw = RawSession::new(
        "Session 1",
        vec![
            RawRow::new("Rohas De Suza Mary Elizabeth", "Club de gymnastique Les Sittelles ON")
                .with_year_of_birth("2012")
                .with_score("9.1"),
        ],
    );

    let session = SessionRecordBuilder::new(&mut store, &mut names).build(&meet, raw);

    assert_eq!(session.status, SessionStatus::Complete);
    let record = &session.records[0];
    assert_eq!(record.canonical_name, "Mary Elizabeth Rohas De Suza");
    assert_eq!(record.club, "Les Sittelles");
    assert_eq!(record.score.as_ref().and_then(|score| score.value()), Some(9.1));
    assert_eq!(record.year_of_birth, Some(2012));
    assert_eq!(record.competition, "Provincial Cup");
    assert!(!record.needs_review);
}

#[test]
fn missing_score_makes_a_session_live_but_zero_does_not() {
    let mut store = CorrectionStore::in_memory();
    let mut names = NameNormalizer::new(Unavailable);
    let meet = competition("1", "Meet", None);
    let mut builder = SessionRecordBuilder::new(&mut store, &mut names);

    let zero = builder.build(&meet, RawSession::new("A", vec![scored("Doe Jane", "0")]));
    let blank = builder.build(&meet, RawSession::new("B", vec![scored("Doe Jane", "  ")]));
    let absent = builder.build(&meet, RawSession::new("C", vec![RawRow::new("Doe Jane", "Gymnix")]));

    assert_eq!(zero.status, SessionStatus::Complete);
    assert_eq!(blank.status, SessionStatus::Live);
    assert_eq!(blank.records[0].score, None);
    assert_eq!(absent.status, SessionStatus::Live);
}

#[test]
fn empty_session_is_complete_and_in_progress_marker_wins() {
    let mut store = CorrectionStore::in_memory();
    let mut names = NameNormalizer::new(Unavailable);
    let meet = competition("1", "Meet", None);
    let mut builder = SessionRecordBuilder::new(&mut store, &mut names);

    let empty = builder.build(&meet, RawSession::new("Empty", Vec::new()));
    let running = builder.build(&meet, RawSession::new("Running", vec![scored("Doe Jane", "12.5")]).in_progress());

    assert_eq!(empty.status, SessionStatus::Complete);
    assert!(empty.records.is_empty());
    assert_eq!(running.status, SessionStatus::Live);
    assert_eq!(running.records.len(), 1);
}

#[test]
fn extra_columns_keep_source_order_and_bad_years_are_unknown() {
    let mut store = CorrectionStore::in_memory();
    let mut names = NameNormalizer::new(Unavailable);
    let meet = competition("1", "Meet", None);
    let row = scored("Doe Jane", "50.1")
        .with_year_of_birth("n/a")
        .with_extra("Vault", "13.2")
        .with_extra("Bars", "12.1")
        .with_extra("Beam", "12.4");

    let session = SessionRecordBuilder::new(&mut store, &mut names).build(&meet, RawSession::new("A", vec![row]));

    let record = &session.records[0];
    assert_eq!(record.year_of_birth, None);
    assert_eq!(record.extra_fields.columns().collect::<Vec<_>>(), ["Vault", "Bars", "Beam"]);
}

#[test]
fn aggregate_keeps_the_union_of_columns() {
    let mut store = CorrectionStore::in_memory();
    let mut names = NameNormalizer::new(Unavailable);
    let a = competition("1", "A", None);
    let b = competition("2", "B", None);

    let mut builder = SessionRecordBuilder::new(&mut store, &mut names);
    let a_sessions = vec![builder.build(&a, RawSession::new("S", vec![scored("Doe Jane", "9.0")]))];
    let b_sessions = vec![builder.build(
        &b,
        RawSession::new("S", vec![scored("Roe Ann", "9.5").with_extra("Vault", "13.0")]),
    )];

    let mut aggregator = Aggregator::new();
    aggregator.add_competition(&a, a_sessions);
    aggregator.add_competition(&b, b_sessions);
    let table = aggregator.finalize();

    assert_eq!(table.columns, ["Vault"]);
    let sheet = table.to_sheet("Results");
    let vault = sheet
        .columns
        .iter()
        .position(|column| column == "Vault")
        .expect("Vault column present");
    assert_eq!(vault, BASE_COLUMNS.len());
    assert_eq!(sheet.rows[0][vault], "");
    assert_eq!(sheet.rows[1][vault], "13.0");
    assert!(sheet.rows.iter().all(|row| row.len() == sheet.columns.len()));
}

#[test]
fn aggregate_preserves_arrival_order_and_duplicates() {
    let mut store = CorrectionStore::in_memory();
    let mut names = NameNormalizer::new(Unavailable);
    let meet = competition("1", "Meet", None);
    let mut builder = SessionRecordBuilder::new(&mut store, &mut names);

    let mut aggregator = Aggregator::new();
    for session_name in ["Zulu", "Alpha", "Mike"] {
        aggregator.add_session(builder.build(
            &meet,
            RawSession::new(
                session_name,
                vec![scored("Young Zoe", "9.0"), scored("Adams Amy", "8.0"), scored("Young Zoe", "9.0")],
            ),
        ));
    }
    let table = aggregator.finalize();

    let order: Vec<(&str, &str)> = table
        .records
        .iter()
        .map(|record| (record.session.as_str(), record.canonical_name.as_str()))
        .collect();
    assert_eq!(
        order,
        [
            ("Zulu", "Zoe Young"),
            ("Zulu", "Amy Adams"),
            ("Zulu", "Zoe Young"),
            ("Alpha", "Zoe Young"),
            ("Alpha", "Amy Adams"),
            ("Alpha", "Zoe Young"),
            ("Mike", "Zoe Young"),
            ("Mike", "Amy Adams"),
            ("Mike", "Zoe Young"),
        ]
    );
}

#[test]
fn one_live_session_out_of_three_is_counted_and_kept() {
    let meet = competition("100", "Meet", Some((2025, 1, 1)));
    let source = FakeSource::default().with(
        meet,
        vec![
            RawSession::new("Level 3", vec![scored("Doe Jane", "35.2")]),
            RawSession::new(
                "Level 4",
                vec![scored("Roe Ann", "36.0"), RawRow::new("Poe Eve", "Gymnix")],
            )
            .in_progress(),
            RawSession::new("Level 5", vec![scored("Lee Kim", "37.1")]),
        ],
    );
    let mut store = CorrectionStore::in_memory();
    let mut exporter = Exporter::new(&source, &mut store, Unavailable);

    let outcome = exporter.export_ids(&[id("100")]).expect("export succeeds");

    assert_eq!(outcome.table.complete_count, 2);
    assert_eq!(outcome.table.live_count, 1);
    assert_eq!(outcome.summary.live_sessions, 1);
    assert!(outcome.table.records.iter().any(|record| record.canonical_name == "Ann Roe"));
    assert_eq!(outcome.table.records.len(), 4);
    assert!(outcome.summary.to_string().contains("1 session(s) still in progress"));
}

#[test]
fn competitions_are_exported_in_the_order_given() {
    let source = FakeSource::default()
        .with(competition("1", "First", None), vec![RawSession::new("S", vec![scored("Doe Jane", "1")])])
        .with(competition("2", "Second", None), vec![RawSession::new("S", vec![scored("Roe Ann", "2")])]);
    let mut store = CorrectionStore::in_memory();
    let mut exporter = Exporter::new(&source, &mut store, Unavailable);

    let outcome = exporter.export_ids(&[id("2"), id("1"), id("2")]).expect("export succeeds");

    let competitions: Vec<&str> = outcome.table.records.iter().map(|r| r.competition.as_str()).collect();
    assert_eq!(competitions, ["Second", "First"]);
    assert_eq!(outcome.summary.competitions, 2);
}

#[test]
fn upstream_failure_aborts_the_whole_aggregate() {
    let mut source = FakeSource::default()
        .with(competition("1", "First", None), vec![RawSession::new("S", vec![scored("Doe Jane", "1")])])
        .with(competition("2", "Second", None), vec![RawSession::new("S", vec![scored("Roe Ann", "2")])])
        .with(competition("3", "Third", None), vec![RawSession::new("S", vec![scored("Lee Kim", "3")])]);
    source.failing.push(id("2"));
    let mut store = CorrectionStore::in_memory();
    let mut exporter = Exporter::new(&source, &mut store, Unavailable);

    let error = exporter
        .export_ids(&[id("1"), id("2"), id("3")])
        .expect_err("export fails");

    match error {
        ExportError::UpstreamUnavailable { competition, .. } => assert_eq!(competition, "2"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(*source.fetched.borrow(), [id("1"), id("2")]);
}

#[test]
fn date_range_export_is_ascending_and_skips_undated() {
    let source = FakeSource::default()
        .with(
            competition("10", "Spring Invitational", Some((2025, 4, 12))),
            vec![RawSession::new("S", vec![scored("Doe Jane", "1")])],
        )
        .with(
            competition("11", "Winter Classic", Some((2025, 1, 20))),
            vec![RawSession::new("S", vec![scored("Roe Ann", "2")])],
        )
        .with(competition("12", "Undated Meet", None), vec![RawSession::new("S", vec![scored("Lee Kim", "3")])])
        .with(
            competition("13", "Summer Games", Some((2025, 7, 1))),
            vec![RawSession::new("S", vec![scored("Poe Eve", "4")])],
        );
    let mut store = CorrectionStore::in_memory();
    let mut exporter = Exporter::new(&source, &mut store, Unavailable);
    let from = NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date");
    let to = NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date");

    let outcome = exporter
        .export_date_range(from, to, &ListingFilter::default())
        .expect("export succeeds");

    let names: Vec<&str> = outcome.competitions.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Winter Classic", "Spring Invitational"]);
}

#[test]
fn names_resolved_in_one_competition_are_reused_in_the_next() {
    let source = FakeSource::default()
        .with(
            competition("1", "First", None),
            vec![RawSession::new("S", vec![scored("Rohas De Suza Mary", "1")])],
        )
        .with(
            competition("2", "Second", None),
            vec![RawSession::new("S", vec![scored("Rohas De Suza Mary", "2")])],
        );
    let backing = MemoryTable::new();
    let mut store = CorrectionStore::new(MemoryTable::new(), backing.clone());
    store.load();
    let mut asked = 0;
    let mut exporter = Exporter::new(
        &source,
        &mut store,
        from_fn(|_raw: &str, _tokens: &[&str]| {
            asked += 1;
            Some(3)
        }),
    );

    let outcome = exporter.export_ids(&[id("1"), id("2")]).expect("export succeeds");
    drop(exporter);

    assert_eq!(asked, 1);
    assert!(
        outcome
            .table
            .records
            .iter()
            .all(|record| record.canonical_name == "Mary Rohas De Suza")
    );
    assert_eq!(backing.pairs().len(), 1);
}

#[test]
fn batch_fallbacks_are_reported_in_the_summary() {
    let source = FakeSource::default().with(
        competition("1", "First", None),
        vec![RawSession::new("S", vec![scored("Garcia Lopez Maria", "1")])],
    );
    let mut store = CorrectionStore::new(MemoryTable::failing(), MemoryTable::new());
    store.load();
    let mut exporter = Exporter::new(&source, &mut store, Unavailable);

    let outcome = exporter.export_ids(&[id("1")]).expect("export succeeds");

    assert_eq!(outcome.table.needs_review().count(), 1);
    assert_eq!(outcome.summary.warnings.len(), 2);
    let summary = outcome.summary.to_string();
    assert!(summary.contains("club corrections unavailable"));
    assert!(summary.contains("'Garcia Lopez Maria' exported as 'Lopez Maria Garcia'"));
}
