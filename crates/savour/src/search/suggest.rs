//! Autocomplete suggestions for partially typed queries.
//!
//! Venue names, item names, cuisine and category labels and item regions are scored against the
//! partial text on their own, merged by text and kind, and capped per kind after scoring.

use std::{cmp::Ordering, collections::VecDeque, fmt, sync::Arc};

use ahash::AHashMap as HashMap;
use itertools::Itertools;
use tracing::{debug, instrument, warn};

use super::{
    SearchConfig, SearchError,
    retrieval::{Lookup, retrieve_kind},
};
use crate::{
    entity::{Cuisine, EntityKind, SearchableEntity},
    relevance::{NormalizedQuery, RelevanceScorer},
    store::EntityStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum SuggestionKind {
    Venue,
    Item,
    Category,
    Region,
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Venue => "venue",
            Self::Item => "item",
            Self::Category => "category",
            Self::Region => "region",
        })
    }
}

/// One autocomplete entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Suggestion {
    pub text: String,
    pub kind: SuggestionKind,
    /// How many catalog entries stand behind this text (may be 0 for fixed cuisine labels)
    pub count: usize,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionResponse {
    /// Ranked suggestions for a non-empty partial query
    Suggestions(Vec<Suggestion>),
    /// The caller's recent searches, returned unscored for an empty partial query
    Recent(Vec<String>),
    Failed(SearchError),
}

impl SuggestionResponse {
    pub fn texts(&self) -> Vec<&str> {
        match self {
            Self::Suggestions(suggestions) => suggestions.iter().map(|s| s.text.as_str()).collect(),
            Self::Recent(recent) => recent.iter().map(String::as_str).collect(),
            Self::Failed(_) => Vec::new(),
        }
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Bounded, most-recent-first list of past queries, owned by the caller.
///
/// Re-recording a query (ignoring case) moves it to the front instead of duplicating it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecentSearches {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for RecentSearches {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl RecentSearches {
    pub const DEFAULT_CAPACITY: usize = 10;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Remember a query. Blank queries are ignored.
    pub fn record(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() || self.capacity == 0 {
            return;
        }
        let lowered = query.to_lowercase();
        self.entries.retain(|entry| entry.to_lowercase() != lowered);
        self.entries.push_front(query.to_string());
        self.entries.truncate(self.capacity);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Autocomplete over venue names, item names, cuisines, categories and regions.
#[derive(Debug)]
pub struct SuggestionIndex<S> {
    store: Arc<S>,
    config: SearchConfig,
    scorer: RelevanceScorer,
}

impl<S: EntityStore> SuggestionIndex<S> {
    pub fn new(store: Arc<S>, config: SearchConfig) -> Self {
        let scorer = config.scorer();
        Self {
            store,
            config,
            scorer,
        }
    }

    #[instrument(name = "Suggest", skip(self, recent), level = "debug")]
    pub async fn suggest(&self, partial: &str, recent: &RecentSearches) -> SuggestionResponse {
        let query = NormalizedQuery::new(partial);
        if query.is_empty() {
            return SuggestionResponse::Recent(recent.to_vec());
        }

        let timeout = self.config.retrieval_timeout;
        let lookup = Lookup::Text(query.as_str());
        let store = self.store.as_ref();
        let gathered = tokio::try_join!(
            retrieve_kind(store, lookup, EntityKind::Venue, timeout),
            retrieve_kind(store, lookup, EntityKind::Item, timeout),
        );
        let (venues, items) = match gathered {
            Ok(found) => found,
            Err(err) => {
                warn!(error = %err, "Suggestion lookup failed");
                return SuggestionResponse::Failed(err);
            }
        };

        let suggestions = self.rank(&query, &venues, &items);
        debug!(
            venues = venues.len(),
            items = items.len(),
            suggestions = suggestions.len(),
            "Suggestions ranked"
        );
        SuggestionResponse::Suggestions(suggestions)
    }

    fn rank(
        &self,
        query: &NormalizedQuery,
        venues: &[SearchableEntity],
        items: &[SearchableEntity],
    ) -> Vec<Suggestion> {
        let fixed_cuisines = Cuisine::ALL
            .iter()
            .map(|cuisine| (cuisine.label(), SuggestionKind::Category, 0));
        let venue_texts = venues.iter().flat_map(|entity| {
            let name = Some((entity.name(), SuggestionKind::Venue, 1));
            let cuisine = entity
                .as_venue()
                .map(|venue| (venue.cuisine.label(), SuggestionKind::Category, 1));
            name.into_iter().chain(cuisine)
        });
        let item_texts = items.iter().filter_map(SearchableEntity::as_item).flat_map(|item| {
            [
                Some((item.name.as_str(), SuggestionKind::Item, 1)),
                Some((item.category.as_str(), SuggestionKind::Category, 1)),
                item.origin
                    .as_deref()
                    .map(|origin| (origin, SuggestionKind::Region, 1)),
            ]
            .into_iter()
            .flatten()
        });

        let mut merged: HashMap<(String, SuggestionKind), Suggestion> = HashMap::new();
        for (text, kind, count) in fixed_cuisines.chain(venue_texts).chain(item_texts) {
            let text = text.trim();
            let score = self.scorer.score_field(query, text);
            if score == 0 {
                continue;
            }
            merged
                .entry((text.to_lowercase(), kind))
                .and_modify(|existing| {
                    existing.score = existing.score.max(score);
                    existing.count += count;
                })
                .or_insert_with(|| Suggestion {
                    text: text.to_string(),
                    kind,
                    count,
                    score,
                });
        }

        // Best-first order within each kind matches the overall order, so one pass caps both.
        let cap = self.config.suggestion_candidates_per_facet;
        let mut per_kind: HashMap<SuggestionKind, usize> = HashMap::new();
        merged
            .into_values()
            .sorted_by(compare_suggestions)
            .filter(|suggestion| {
                let taken = per_kind.entry(suggestion.kind).or_default();
                *taken += 1;
                *taken <= cap
            })
            .take(self.config.max_suggestions)
            .collect()
    }
}

fn compare_suggestions(a: &Suggestion, b: &Suggestion) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.text.to_lowercase().cmp(&b.text.to_lowercase()))
        .then_with(|| a.text.cmp(&b.text))
        .then_with(|| a.kind.cmp(&b.kind))
}
