//! Retrieval, filtering, scoring, ordering and pagination of search results.
//!
//! The pipeline runs in two halves. The async half talks to the [`EntityStore`] (bounded by the
//! configured timeout, one lookup per entity kind, concurrently). The sync half,
//! [`rank_candidates`], is pure: given the same candidates and request it always produces the
//! same page, which is what makes ordering deterministic across runs.

use std::{cmp::Ordering, sync::Arc};

use futures::future::try_join_all;
use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use super::{
    HARD_PAGE_CAP, ScoredResult, SearchConfig, SearchError, SearchPage, SearchRequest,
    SearchResponse,
    error::Result,
    retrieval::{Lookup, dedup_candidates, retrieve_kind},
};
use crate::{
    entity::{Coordinate, EntityScope, SearchableEntity},
    filter::{FilterCompositor, FilterSpec, SortDirection, SortKey},
    geo::{self, TravelMode},
    relevance::{NormalizedQuery, RelevanceScorer},
    store::EntityStore,
};

/// Offset/limit slice of the ordered matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
}

impl PageWindow {
    pub const fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }
}

/// Orchestrates a search against an [`EntityStore`].
#[derive(Debug)]
pub struct RankingPipeline<S> {
    store: Arc<S>,
    config: SearchConfig,
    scorer: RelevanceScorer,
}

impl<S: EntityStore> RankingPipeline<S> {
    pub fn new(store: Arc<S>, config: SearchConfig) -> Self {
        let scorer = config.scorer();
        Self {
            store,
            config,
            scorer,
        }
    }

    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run a search; failures come back as an empty, unsuccessful response.
    #[instrument(name = "Ranking search", skip_all, fields(query = %request.query, scope = ?request.scope), level = "debug")]
    pub async fn search(&self, request: &SearchRequest) -> SearchResponse {
        let outcome = self.execute(request).await;
        if let Err(err) = &outcome {
            warn!(error = %err, retryable = err.is_retryable(), "Search failed");
        }
        outcome.into()
    }

    /// Run a search, returning failures as errors.
    pub async fn execute(&self, request: &SearchRequest) -> Result<SearchPage> {
        let window = self.validate(request)?;
        let no_filters = FilterSpec::default();
        let filters = request.filters.as_ref().unwrap_or(&no_filters);

        if !filters.can_match(request.scope) {
            debug!(
                scope = ?request.scope,
                "Facets cannot apply to any entity kind in scope, no matches"
            );
            return Ok(SearchPage::empty());
        }

        let query = NormalizedQuery::new(&request.query);
        let candidates = self.retrieve(&query, filters, request.scope).await?;
        debug!(candidates = candidates.len(), "Candidates retrieved");

        Ok(rank_candidates(
            candidates,
            &query,
            filters,
            request.searcher_location,
            window,
            &self.config,
            &self.scorer,
        ))
    }

    /// Reject malformed input before touching the store.
    fn validate(&self, request: &SearchRequest) -> Result<PageWindow> {
        if let Some(location) = request.searcher_location
            && !location.is_valid()
        {
            return Err(SearchError::MalformedInput(format!(
                "searcher location {location} is not a valid coordinate"
            )));
        }
        if let Some(filters) = &request.filters {
            filters.validate().map_err(SearchError::MalformedInput)?;
        }
        let max = self.config.max_page_limit.clamp(1, HARD_PAGE_CAP);
        let limit = match request.page_limit {
            Some(0) => {
                return Err(SearchError::MalformedInput(
                    "page_limit must be positive".to_string(),
                ));
            }
            Some(limit) => limit.min(max),
            None => self.config.default_page_limit.clamp(1, max),
        };
        Ok(PageWindow {
            offset: request.offset,
            limit,
        })
    }

    async fn retrieve(
        &self,
        query: &NormalizedQuery,
        filters: &FilterSpec,
        scope: EntityScope,
    ) -> Result<Vec<SearchableEntity>> {
        let lookup = if query.is_empty() {
            Lookup::Facet(filters)
        } else {
            Lookup::Text(query.as_str())
        };
        let timeout = self.config.retrieval_timeout;
        let batches = try_join_all(
            scope
                .kinds()
                .iter()
                .map(|&kind| retrieve_kind(self.store.as_ref(), lookup, kind, timeout)),
        )
        .await?;
        Ok(dedup_candidates(batches.into_iter().flatten().collect()))
    }
}

/// Filter, score, order and paginate an already retrieved candidate set.
///
/// Pure and deterministic. Relevance-0 candidates are dropped unless `query` is empty.
pub fn rank_candidates(
    candidates: Vec<SearchableEntity>,
    query: &NormalizedQuery,
    filters: &FilterSpec,
    searcher: Option<Coordinate>,
    window: PageWindow,
    config: &SearchConfig,
    scorer: &RelevanceScorer,
) -> SearchPage {
    let browsing = query.is_empty();
    let survivors = FilterCompositor::new(filters, searcher).apply(candidates);

    let annotate = |entity: SearchableEntity| -> Option<ScoredResult> {
        let relevance = scorer.score_entity(query, &entity);
        if relevance == 0 && !browsing {
            return None;
        }
        Some(annotate_distance(entity, relevance, searcher, config))
    };
    let mut scored: Vec<ScoredResult> = if survivors.len() > config.parallel_threshold {
        survivors.into_par_iter().filter_map(annotate).collect()
    } else {
        survivors.into_iter().filter_map(annotate).collect()
    };

    let sort = filters
        .sort_by
        .map(|key| (key, filters.sort_direction.unwrap_or(key.default_direction())));
    scored.sort_by(|a, b| compare_results(a, b, sort));

    let total_matches = scored.len();
    let results = scored
        .into_iter()
        .skip(window.offset)
        .take(window.limit)
        .collect();
    SearchPage {
        results,
        total_matches,
    }
}

fn annotate_distance(
    entity: SearchableEntity,
    relevance: u32,
    searcher: Option<Coordinate>,
    config: &SearchConfig,
) -> ScoredResult {
    let distance_km = searcher
        .zip(entity.coordinate())
        .map(|(from, to)| geo::distance_km(from, to))
        .filter(|km| km.is_finite());
    let distance_label = distance_km.map(geo::format_distance);
    let travel_time = distance_km.map(|km| {
        let mode = TravelMode::for_distance(km, config.walking_threshold_km);
        geo::estimate_travel_time_with(km, mode, &config.travel_speeds)
    });
    ScoredResult {
        entity,
        relevance,
        distance_km,
        distance_label,
        travel_time,
    }
}

/// Total order: the requested sort key first, then relevance, rating, name, kind and id.
fn compare_results(
    a: &ScoredResult,
    b: &ScoredResult,
    sort: Option<(SortKey, SortDirection)>,
) -> Ordering {
    sort.map_or(Ordering::Equal, |(key, direction)| {
        compare_by_key(a, b, key, direction)
    })
    .then_with(|| b.relevance.cmp(&a.relevance))
    .then_with(|| b.entity.rating().total_cmp(&a.entity.rating()))
    .then_with(|| compare_names(a.entity.name(), b.entity.name()))
    .then_with(|| a.entity.kind().cmp(&b.entity.kind()))
    .then_with(|| a.entity.id().cmp(b.entity.id()))
}

fn compare_by_key(
    a: &ScoredResult,
    b: &ScoredResult,
    key: SortKey,
    direction: SortDirection,
) -> Ordering {
    let directed = |ordering: Ordering| match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    };
    match key {
        SortKey::Relevance => directed(a.relevance.cmp(&b.relevance)),
        SortKey::Rating => directed(a.entity.rating().total_cmp(&b.entity.rating())),
        SortKey::Name => directed(compare_names(a.entity.name(), b.entity.name())),
        SortKey::Price => compare_missing_last(a.entity.price(), b.entity.price(), directed),
        SortKey::Distance => compare_missing_last(a.distance_km, b.distance_km, directed),
    }
}

/// Entities without the value sort after those with it, whatever the direction.
fn compare_missing_last(
    a: Option<f64>,
    b: Option<f64>,
    directed: impl Fn(Ordering) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => directed(a.total_cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}
