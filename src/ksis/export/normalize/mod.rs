//! Athlete and club name normalisation.

pub mod prompt;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::ksis::export::corrections::CorrectionStore;
use crate::ksis::export::report::Warning;

pub use prompt::{Disambiguator, FromFn, LineInput, TerminalPrompt, Unavailable, from_fn};

/// Trims and collapses runs of whitespace to a single space.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds "First Last" from "Last First" tokens where the first `split`
/// tokens are the last name.
fn reorder(tokens: &[&str], split: usize) -> String {
    let mut reordered: Vec<&str> = Vec::with_capacity(tokens.len());
    reordered.extend_from_slice(&tokens[split..]);
    reordered.extend_from_slice(&tokens[..split]);
    reordered.join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub canonical: String,
    /// The split was guessed because nobody could be asked.
    pub needs_review: bool,
}

impl NormalizedName {
    fn resolved(canonical: String) -> Self {
        Self {
            canonical,
            needs_review: false,
        }
    }
}

/// Turns scraped "Last First" names into "First Last".
///
/// Two-token names are swapped directly. Longer names are looked up in the
/// [`CorrectionStore`]; unknown ones are put to the [`Disambiguator`] and the
/// answer is saved. Each raw form is resolved at most once per normalizer.
pub struct NameNormalizer<D> {
    disambiguator: D,
    resolved: HashMap<String, NormalizedName>,
    warnings: Vec<Warning>,
}

impl<D: Disambiguator> NameNormalizer<D> {
    pub fn new(disambiguator: D) -> Self {
        Self {
            disambiguator,
            resolved: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn normalize(&mut self, raw: &str, store: &mut CorrectionStore) -> NormalizedName {
        let raw_form = collapse_whitespace(raw);
        let tokens: Vec<&str> = raw_form.split(' ').filter(|t| !t.is_empty()).collect();

        match tokens.len() {
            0 | 1 => return NormalizedName::resolved(raw_form.clone()),
            2 => return NormalizedName::resolved(format!("{} {}", tokens[1], tokens[0])),
            _ => {}
        }

        if let Some(known) = self.resolved.get(&raw_form) {
            return known.clone();
        }

        let normalized = match store.lookup_name(&raw_form) {
            Some(canonical) => NormalizedName::resolved(canonical.to_string()),
            None => self.disambiguate(&raw_form, &tokens, store),
        };

        self.resolved.insert(raw_form.clone(), normalized.clone());
        normalized
    }

    fn disambiguate(
        &mut self,
        raw_form: &str,
        tokens: &[&str],
        store: &mut CorrectionStore,
    ) -> NormalizedName {
        match self.disambiguator.split_point(raw_form, tokens) {
            Some(split) if (1..tokens.len()).contains(&split) => {
                let canonical = reorder(tokens, split);
                debug!(raw_form, canonical = %canonical, split, "name resolved");
                store.record_name_correction(raw_form, &canonical);
                NormalizedName::resolved(canonical)
            }
            answer => {
                if let Some(split) = answer {
                    warn!(raw_form, split, "split point out of range, using fallback");
                }
                let fallback = reorder(tokens, 1);
                warn!(raw_form, fallback = %fallback, "name needs review");
                self.warnings.push(Warning::AmbiguousNameUnresolved {
                    raw_form: raw_form.to_string(),
                    fallback: fallback.clone(),
                });
                NormalizedName {
                    canonical: fallback,
                    needs_review: true,
                }
            }
        }
    }

    /// Drains the warnings queued since the last call.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}

/// Applies club corrections. Unmapped clubs come back unchanged.
pub struct ClubNormalizer<'a> {
    store: &'a CorrectionStore,
}

impl<'a> ClubNormalizer<'a> {
    pub fn new(store: &'a CorrectionStore) -> Self {
        Self { store }
    }

    pub fn normalize(&self, raw: &str) -> String {
        let club = collapse_whitespace(raw);
        match self.store.lookup_club(&club) {
            Some(corrected) => corrected.to_string(),
            None => club,
        }
    }
}
