//! Parsers for the ksis.eu pages. Each function takes the page body and does
//! no I/O.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::ksis::export::error::{ExportError, Result};
use crate::ksis::export::model::{Competition, CompetitionId, RawRow, RawSession};
use crate::ksis::export::normalize::collapse_whitespace;

/// Table holding the per-athlete results of one session.
pub const RESULTS_TABLE_ID: &str = "myTablePrihlasky";
/// Rows with fewer cells are headers, separators or notes.
pub const MIN_RESULT_CELLS: usize = 9;

const ATHLETE_CELL: usize = 2;
const YOB_CELL: usize = 3;
const SCORE_CELL: usize = 8;

static PROP_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"id_prop=(\d+)").expect("valid id_prop pattern"));
static DOTTED_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\.(\d{1,2})\.(\d{4})").expect("valid date pattern"));
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").expect("valid date pattern"));
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break pattern"));

/// Session option from the competition page's session selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRef {
    pub value: String,
    pub name: String,
}

/// Competition page: header fields plus the session selector, which is
/// absent when the page has no results yet.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitionPage {
    pub competition: Competition,
    pub sessions: Option<Vec<SessionRef>>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|error| ExportError::Parse(format!("invalid selector '{css}': {error}")))
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn fragment_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    collapse_whitespace(&fragment.root_element().text().collect::<String>())
}

/// Extracts a date written as `DD.MM.YYYY` or `YYYY-MM-DD` anywhere in `text`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Some(captures) = DOTTED_DATE.captures(text) {
        let day = captures[1].parse().ok()?;
        let month = captures[2].parse().ok()?;
        let year = captures[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(captures) = ISO_DATE.captures(text) {
        let year = captures[1].parse().ok()?;
        let month = captures[2].parse().ok()?;
        let day = captures[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    None
}

/// Parses the competition listing. Entries are kept in page order, the first
/// link for an id wins, and a `badge` span mentioning "live" next to the link
/// marks the competition live.
pub fn parse_listing(html: &str) -> Result<Vec<Competition>> {
    let document = Html::parse_document(html);
    let links = selector("a[href]")?;
    let badges = selector("span.badge")?;

    let mut competitions: Vec<Competition> = Vec::new();
    for link in document.select(&links) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(captures) = PROP_ID.captures(href) else {
            continue;
        };
        let name = element_text(link);
        if name.is_empty() {
            continue;
        }
        let id: CompetitionId = captures[1].parse()?;
        if competitions.iter().any(|known| known.id == id) {
            continue;
        }

        let is_live = link
            .parent()
            .and_then(ElementRef::wrap)
            .map(|parent| {
                parent
                    .select(&badges)
                    .any(|badge| element_text(badge).to_lowercase().contains("live"))
            })
            .unwrap_or(false);

        let mut competition = Competition::new(id, name);
        competition.is_live = is_live;
        competitions.push(competition);
    }

    Ok(competitions)
}

/// Parses a competition results page (`resultx.php`).
pub fn parse_competition_page(id: &CompetitionId, html: &str) -> Result<CompetitionPage> {
    let document = Html::parse_document(html);

    let name = document
        .select(&selector("h3")?)
        .next()
        .map(element_text)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Unknown_Competition".to_string())
        .replace(['/', '\\'], "-");
    let date = document
        .select(&selector("h4")?)
        .next()
        .map(element_text)
        .and_then(|text| parse_date(&text));

    let sessions = match document.select(&selector("select#id_sut")?).next() {
        Some(select) => {
            let options = selector("option")?;
            Some(
                select
                    .select(&options)
                    .map(|option| SessionRef {
                        value: option.value().attr("value").unwrap_or_default().to_string(),
                        name: element_text(option),
                    })
                    .collect(),
            )
        }
        None => None,
    };

    Ok(CompetitionPage {
        competition: Competition::new(id.clone(), name).with_date(date),
        sessions,
    })
}

/// True when the session label itself says the session is still running.
pub fn session_name_marks_live(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("live") || lower.contains("in progress")
}

/// Parses the results table of one session. A page without the results
/// table is a session that has not published results yet.
pub fn parse_session_results(session_name: &str, html: &str) -> Result<RawSession> {
    let document = Html::parse_document(html);
    let table_selector = selector(&format!("table#{RESULTS_TABLE_ID}"))?;

    let Some(table) = document.select(&table_selector).next() else {
        return Ok(RawSession::new(session_name, Vec::new()).in_progress());
    };

    let header_cells = selector("th")?;
    let headers = unique_headers(table.select(&header_cells).map(element_text).collect());

    let row_selector = selector("tr")?;
    let cell_selector = selector("td")?;
    let mut rows = Vec::new();
    for row in table.select(&row_selector) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
        if cells.len() < MIN_RESULT_CELLS {
            continue;
        }
        if let Some(parsed) = parse_result_row(&cells, &headers)? {
            rows.push(parsed);
        }
    }

    let mut session = RawSession::new(session_name, rows);
    session.in_progress = session_name_marks_live(session_name);
    Ok(session)
}

/// Repeated header names get a numeric suffix: `D`, `E`, `D (2)`, `E (2)`.
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        if header.is_empty() || !seen.contains(&header) {
            seen.push(header);
            continue;
        }
        let mut suffix = 2;
        let mut renamed = format!("{header} ({suffix})");
        while seen.contains(&renamed) {
            suffix += 1;
            renamed = format!("{header} ({suffix})");
        }
        seen.push(renamed);
    }
    seen
}

fn parse_result_row(cells: &[ElementRef<'_>], headers: &[String]) -> Result<Option<RawRow>> {
    let athlete_html = cells[ATHLETE_CELL].inner_html();
    let mut parts = LINE_BREAK.splitn(&athlete_html, 2);
    let (Some(name_html), Some(club_html)) = (parts.next(), parts.next()) else {
        return Ok(None);
    };

    let name_fragment = Html::parse_fragment(name_html);
    let name = match name_fragment.select(&selector("a")?).next() {
        Some(link) => element_text(link),
        None => fragment_text(name_html),
    };
    if name.is_empty() {
        return Ok(None);
    }

    let mut row = RawRow::new(name, fragment_text(club_html));
    let year = element_text(cells[YOB_CELL]);
    if !year.is_empty() {
        row.year_of_birth = Some(year);
    }
    let score = element_text(cells[SCORE_CELL]);
    if !score.is_empty() {
        row.score = Some(score);
    }

    for (idx, cell) in cells.iter().enumerate() {
        if matches!(idx, ATHLETE_CELL | YOB_CELL | SCORE_CELL) {
            continue;
        }
        let Some(header) = headers.get(idx).filter(|header| !header.is_empty()) else {
            continue;
        };
        row.extra.insert(header.clone(), element_text(*cell));
    }

    Ok(Some(row))
}
