use std::cell::RefCell;
use std::collections::HashMap;

use reqwest::blocking::Client;
use tracing::{debug, info, instrument, warn};

use crate::ksis::export::config::Settings;
use crate::ksis::export::error::{ExportError, Result};
use crate::ksis::export::io::html::{self, CompetitionPage};
use crate::ksis::export::model::{Competition, CompetitionId, RawSession};
use crate::ksis::export::source::ResultsSource;

const USER_AGENT: &str = concat!("ksis-export/", env!("CARGO_PKG_VERSION"));

/// Blocking client for ksis.eu. Competition pages are fetched once and kept
/// for the lifetime of the client.
pub struct KsisClient {
    http: Client,
    base_url: String,
    discipline: String,
    country: String,
    pages: RefCell<HashMap<CompetitionId, CompetitionPage>>,
}

impl KsisClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url().to_string(),
            discipline: settings.discipline.clone(),
            country: settings.country.clone(),
            pages: RefCell::new(HashMap::new()),
        })
    }

    fn get(&self, url: &str) -> Result<String> {
        debug!(url, "fetching");
        let response = self.http.get(url).send()?.error_for_status()?;
        let body = response.text()?;
        debug!(bytes = body.len(), "received");
        Ok(body)
    }

    fn listing_url(&self) -> String {
        format!(
            "{}/menu.php?akcia=S&oblast={}&country={}",
            self.base_url, self.discipline, self.country
        )
    }

    fn competition_url(&self, id: &CompetitionId) -> String {
        format!("{}/resultx.php?id_prop={id}", self.base_url)
    }

    fn session_url(&self, id: &CompetitionId, session: &str) -> String {
        format!(
            "{}/load_result_total_ksismg_art.php?lang=en&id_prop={id}&id_sut={session}\
             &rn=null&mn=null&state=-1&age_group=&award=-1&nacinie=undefined",
            self.base_url
        )
    }

    fn competition_page(&self, id: &CompetitionId) -> Result<CompetitionPage> {
        if let Some(page) = self.pages.borrow().get(id) {
            return Ok(page.clone());
        }
        let body = self
            .get(&self.competition_url(id))
            .map_err(|error| ExportError::UpstreamUnavailable {
                competition: id.to_string(),
                reason: error.to_string(),
            })?;
        let page = html::parse_competition_page(id, &body)?;
        self.pages.borrow_mut().insert(id.clone(), page.clone());
        Ok(page)
    }
}

impl ResultsSource for KsisClient {
    #[instrument(level = "info", skip_all)]
    fn list_competitions(&self) -> Result<Vec<Competition>> {
        let body = self
            .get(&self.listing_url())
            .map_err(|error| ExportError::UpstreamUnavailable {
                competition: "listing".to_string(),
                reason: error.to_string(),
            })?;
        let competitions = html::parse_listing(&body)?;
        info!(count = competitions.len(), "competitions listed");
        Ok(competitions)
    }

    fn fetch_competition(&self, id: &CompetitionId) -> Result<Competition> {
        Ok(self.competition_page(id)?.competition)
    }

    #[instrument(level = "info", skip_all, fields(competition = %competition.id))]
    fn fetch_sessions(&self, competition: &Competition) -> Result<Vec<RawSession>> {
        let page = self.competition_page(&competition.id)?;
        let Some(refs) = page.sessions else {
            return Err(ExportError::UpstreamUnavailable {
                competition: competition.id.to_string(),
                reason: "no session list on the results page; sessions may still be in \
                         progress or the id is wrong"
                    .to_string(),
            });
        };

        let mut sessions = Vec::with_capacity(refs.len());
        for session in refs {
            let url = self.session_url(&competition.id, &session.value);
            let raw = match self.get(&url) {
                Ok(body) => html::parse_session_results(&session.name, &body)?,
                Err(error) => {
                    warn!(session = %session.name, %error, "could not fetch session results");
                    RawSession::new(session.name, Vec::new()).in_progress()
                }
            };
            sessions.push(raw);
        }
        Ok(sessions)
    }
}
