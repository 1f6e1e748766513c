use crate::ksis::export::error::Result;
use crate::ksis::export::model::{Competition, CompetitionId, RawSession};

/// Where competitions and their raw result rows come from.
pub trait ResultsSource {
    /// All competitions in listing order.
    fn list_competitions(&self) -> Result<Vec<Competition>>;

    /// Header data of one competition.
    fn fetch_competition(&self, id: &CompetitionId) -> Result<Competition>;

    /// Raw rows of every session, in the order the site lists them.
    fn fetch_sessions(&self, competition: &Competition) -> Result<Vec<RawSession>>;
}

/// Narrows a competition listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub live_only: bool,
    /// Case-insensitive substring of the competition name.
    pub keyword: Option<String>,
}

impl ListingFilter {
    pub fn live() -> Self {
        Self {
            live_only: true,
            keyword: None,
        }
    }

    pub fn search(keyword: impl Into<String>) -> Self {
        Self {
            live_only: false,
            keyword: Some(keyword.into()),
        }
    }

    pub fn matches(&self, competition: &Competition) -> bool {
        if self.live_only && !competition.is_live {
            return false;
        }
        match &self.keyword {
            Some(keyword) => competition
                .name
                .to_lowercase()
                .contains(&keyword.trim().to_lowercase()),
            None => true,
        }
    }

    pub fn apply(&self, competitions: Vec<Competition>) -> Vec<Competition> {
        competitions
            .into_iter()
            .filter(|competition| self.matches(competition))
            .collect()
    }
}
