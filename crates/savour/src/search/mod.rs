//! Search over the catalog: ranking, autocomplete and superseding sessions.
//!
//! This module holds the request/response types shared by the [`RankingPipeline`] and the
//! [`SuggestionIndex`], the tunable [`SearchConfig`], and the error taxonomy both surface.

use std::time::Duration;

pub use error::{RetrievalStep, SearchError};
use error::Result;
pub use pipeline::{PageWindow, RankingPipeline, rank_candidates};
pub use session::SearchSession;
pub use suggest::{RecentSearches, Suggestion, SuggestionIndex, SuggestionKind, SuggestionResponse};

use crate::{
    SearchConfigBuilder,
    entity::{Coordinate, EntityScope, SearchableEntity},
    filter::FilterSpec,
    geo::TravelSpeeds,
    relevance::{FieldWeights, RelevanceScorer, RelevanceWeights},
};

mod pipeline;
mod retrieval;
mod session;
mod suggest;

/// Largest page any request can ask for, whatever the configuration says.
pub const HARD_PAGE_CAP: usize = 200;

/// Tunable policy for searching and suggesting.
///
/// Use [`SearchConfigBuilder`] for presets and validated scoring weights.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Page size when a request does not ask for one
    pub default_page_limit: usize,
    /// Upper bound for requested page sizes (never above [`HARD_PAGE_CAP`])
    pub max_page_limit: usize,
    /// Bound on each store round-trip
    pub retrieval_timeout: Duration,
    pub relevance_weights: RelevanceWeights,
    pub field_weights: FieldWeights,
    pub travel_speeds: TravelSpeeds,
    /// Below this distance the travel estimate assumes walking
    pub walking_threshold_km: f64,
    /// Candidate count above which scoring fans out across threads
    pub parallel_threshold: usize,
    pub max_suggestions: usize,
    /// How many names each suggestion facet considers
    pub suggestion_candidates_per_facet: usize,
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    pub const fn scorer(&self) -> RelevanceScorer {
        RelevanceScorer::new(self.relevance_weights, self.field_weights)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_limit: 50,
            max_page_limit: HARD_PAGE_CAP,
            retrieval_timeout: Duration::from_secs(3),
            relevance_weights: RelevanceWeights::default(),
            field_weights: FieldWeights::default(),
            travel_speeds: TravelSpeeds::default(),
            walking_threshold_km: 1.5,
            parallel_threshold: 256,
            max_suggestions: 10,
            suggestion_candidates_per_facet: 20,
        }
    }
}

/// A single search: free text, optional facets, optional searcher position.
///
/// An empty query means "browse": every candidate that passes the filters is returned with
/// relevance 0.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SearchRequest {
    pub query: String,
    pub filters: Option<FilterSpec>,
    pub searcher_location: Option<Coordinate>,
    /// Defaults to the configured page size, capped at the configured maximum
    pub page_limit: Option<usize>,
    pub offset: usize,
    pub scope: EntityScope,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// An empty-query request.
    pub fn browse() -> Self {
        Self::default()
    }

    pub fn with_filters(mut self, filters: FilterSpec) -> Self {
        self.filters = Some(filters);
        self
    }

    pub const fn with_location(mut self, location: Coordinate) -> Self {
        self.searcher_location = Some(location);
        self
    }

    pub const fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = Some(limit);
        self
    }

    pub const fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub const fn with_scope(mut self, scope: EntityScope) -> Self {
        self.scope = scope;
        self
    }
}

/// One ranked entity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoredResult {
    pub entity: SearchableEntity,
    pub relevance: u32,
    /// Present when a searcher location was given and the entity is located
    pub distance_km: Option<f64>,
    /// e.g. "350 m"
    pub distance_label: Option<String>,
    /// e.g. "7 min walk"; illustrative, not an ETA
    pub travel_time: Option<String>,
}

impl ScoredResult {
    pub fn name(&self) -> &str {
        self.entity.name()
    }
}

/// A ranked page together with the number of matches before truncation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub results: Vec<ScoredResult>,
    pub total_matches: usize,
}

impl SearchPage {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// What callers of a search receive: either a page or an explicit failure, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub results: Vec<ScoredResult>,
    pub total_matches: usize,
    pub success: bool,
    pub error: Option<SearchError>,
}

impl SearchResponse {
    pub fn failure(error: SearchError) -> Self {
        Self {
            results: Vec::new(),
            total_matches: 0,
            success: false,
            error: Some(error),
        }
    }

    /// Whether trying again later may succeed.
    pub fn is_retryable(&self) -> bool {
        self.error.as_ref().is_some_and(SearchError::is_retryable)
    }

    pub fn names(&self) -> Vec<&str> {
        self.results.iter().map(ScoredResult::name).collect()
    }
}

impl From<SearchPage> for SearchResponse {
    fn from(page: SearchPage) -> Self {
        Self {
            results: page.results,
            total_matches: page.total_matches,
            success: true,
            error: None,
        }
    }
}

impl From<Result<SearchPage>> for SearchResponse {
    fn from(outcome: Result<SearchPage>) -> Self {
        outcome.map_or_else(Self::failure, Self::from)
    }
}

mod error {
    use std::{fmt, time::Duration};

    use thiserror::Error;

    use crate::entity::EntityKind;

    /// Which store lookup was running when retrieval went wrong.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum RetrievalStep {
        TextLookup,
        FacetLookup,
    }

    impl fmt::Display for RetrievalStep {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::TextLookup => f.write_str("text lookup"),
                Self::FacetLookup => f.write_str("facet lookup"),
            }
        }
    }

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum SearchError {
        #[error("Retrieving {kind} candidates failed during {step}: {reason}")]
        RetrievalFailure {
            kind: EntityKind,
            step: RetrievalStep,
            reason: String,
        },
        #[error("Retrieving {kind} candidates timed out after {after:?} during {step}")]
        Timeout {
            kind: EntityKind,
            step: RetrievalStep,
            after: Duration,
        },
        #[error("Malformed input: {0}")]
        MalformedInput(String),
    }

    impl SearchError {
        pub const fn is_retryable(&self) -> bool {
            matches!(self, Self::RetrievalFailure { .. } | Self::Timeout { .. })
        }

        /// Text suitable for showing to the person searching.
        pub const fn user_message(&self) -> &'static str {
            if self.is_retryable() {
                "Search unavailable, try again"
            } else {
                "Search request is invalid"
            }
        }
    }

    pub type Result<T> = std::result::Result<T, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;

    #[test]
    fn test_failure_response_is_empty_and_flagged() {
        let response = SearchResponse::failure(SearchError::Timeout {
            kind: EntityKind::Venue,
            step: RetrievalStep::TextLookup,
            after: Duration::from_secs(3),
        });
        assert!(!response.success);
        assert!(response.results.is_empty());
        assert_eq!(response.total_matches, 0);
        assert!(response.is_retryable());
        assert_eq!(
            response.error.as_ref().map(SearchError::user_message),
            Some("Search unavailable, try again")
        );
    }

    #[test]
    fn test_malformed_input_is_not_retryable() {
        let error = SearchError::MalformedInput("page_limit must be positive".into());
        assert!(!error.is_retryable());
        assert!(error.to_string().contains("page_limit"));
    }

    #[test]
    fn test_error_display_carries_context() {
        let error = SearchError::RetrievalFailure {
            kind: EntityKind::Item,
            step: RetrievalStep::FacetLookup,
            reason: "connection reset".into(),
        };
        assert_eq!(
            error.to_string(),
            "Retrieving item candidates failed during facet lookup: connection reset"
        );
    }

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new("suya")
            .with_location(Coordinate::new(6.5, 3.4))
            .with_page_limit(10)
            .with_offset(5)
            .with_scope(EntityScope::Items);
        assert_eq!(request.query, "suya");
        assert_eq!(request.page_limit, Some(10));
        assert_eq!(request.offset, 5);
        assert_eq!(request.scope, EntityScope::Items);
        assert!(SearchRequest::browse().query.is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.default_page_limit, 50);
        assert_eq!(config.max_page_limit, HARD_PAGE_CAP);
        assert_eq!(config.max_suggestions, 10);
        assert_eq!(config.retrieval_timeout, Duration::from_secs(3));
    }
}
