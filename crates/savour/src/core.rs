//! The main entry point for searching a catalog.
//!
//! [`DiscoverySearcher`] ties a shared [`EntityStore`] to a [`SearchConfig`] and exposes ranked
//! search, batched search, autocomplete and superseding sessions on top of it.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use savour::{DiscoverySearcher, InMemoryEntityStore, ItemEntity};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), savour::error::SavourError> {
//! let store = InMemoryEntityStore::from_entities([
//!     ItemEntity::new("i1", "v1", "Jollof Rice", 6.5).into(),
//!     ItemEntity::new("i2", "v1", "Suya", 4.0).into(),
//! ])?;
//! let searcher = DiscoverySearcher::new(Arc::new(store));
//!
//! let response = searcher.search("jollof").await;
//! assert_eq!(response.names(), vec!["Jollof Rice"]);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, instrument};

use crate::{
    error::SavourError,
    search::{
        HARD_PAGE_CAP, RankingPipeline, RecentSearches, SearchConfig, SearchRequest,
        SearchResponse, SearchSession, SuggestionIndex, SuggestionResponse,
    },
    store::EntityStore,
};

/// Search, autocomplete and sessions over one catalog.
///
/// Cheap to clone: clones share the store and configuration.
pub struct DiscoverySearcher<S> {
    pipeline: Arc<RankingPipeline<S>>,
    suggestions: Arc<SuggestionIndex<S>>,
}

impl<S> Clone for DiscoverySearcher<S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            suggestions: Arc::clone(&self.suggestions),
        }
    }
}

impl<S: EntityStore> DiscoverySearcher<S> {
    /// Create a searcher with the default configuration.
    pub fn new(store: Arc<S>) -> Self {
        Self::from_parts(store, SearchConfig::default())
    }

    pub fn builder(store: Arc<S>) -> DiscoverySearcherBuilder<S> {
        DiscoverySearcherBuilder::new(store)
    }

    fn from_parts(store: Arc<S>, config: SearchConfig) -> Self {
        info!(
            default_page_limit = config.default_page_limit,
            retrieval_timeout = ?config.retrieval_timeout,
            "Creating DiscoverySearcher"
        );
        Self {
            suggestions: Arc::new(SuggestionIndex::new(Arc::clone(&store), config.clone())),
            pipeline: Arc::new(RankingPipeline::new(store, config)),
        }
    }

    /// Free-text search with no filters, location or paging.
    pub async fn search(&self, query: &str) -> SearchResponse {
        self.pipeline.search(&SearchRequest::new(query)).await
    }

    pub async fn search_request(&self, request: &SearchRequest) -> SearchResponse {
        self.pipeline.search(request).await
    }

    /// Run one request under a different configuration, sharing this searcher's store.
    pub async fn search_with_config(
        &self,
        request: &SearchRequest,
        config: &SearchConfig,
    ) -> SearchResponse {
        RankingPipeline::new(Arc::clone(self.pipeline.store()), config.clone())
            .search(request)
            .await
    }

    /// Run several requests concurrently. Responses come back in request order.
    #[instrument(name = "Bulk search", skip_all, fields(requests = requests.len()), level = "debug")]
    pub async fn search_bulk(&self, requests: &[SearchRequest]) -> Vec<SearchResponse> {
        join_all(requests.iter().map(|request| self.pipeline.search(request))).await
    }

    /// Autocomplete `partial`; an empty partial returns `recent` instead.
    pub async fn suggest(&self, partial: &str, recent: &RecentSearches) -> SuggestionResponse {
        self.suggestions.suggest(partial, recent).await
    }

    /// Open a session in which each new search supersedes the previous one.
    pub fn session(&self) -> SearchSession<S> {
        SearchSession::new(Arc::clone(&self.pipeline))
    }

    pub fn config(&self) -> &SearchConfig {
        self.pipeline.config()
    }

    pub fn store(&self) -> &Arc<S> {
        self.pipeline.store()
    }
}

/// Builder for creating a [`DiscoverySearcher`] with custom configuration.
#[derive(Debug, Clone)]
pub struct DiscoverySearcherBuilder<S> {
    store: Arc<S>,
    config: SearchConfig,
}

impl<S: EntityStore> DiscoverySearcherBuilder<S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: SearchConfig::default(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the searcher, rejecting configurations that could never serve a page.
    pub fn build(self) -> Result<DiscoverySearcher<S>, SavourError> {
        let config = &self.config;
        if config.max_page_limit == 0 || config.max_page_limit > HARD_PAGE_CAP {
            return Err(SavourError::ConfigError(format!(
                "max_page_limit must be between 1 and {HARD_PAGE_CAP}, got {}",
                config.max_page_limit
            )));
        }
        if config.default_page_limit == 0 {
            return Err(SavourError::ConfigError(
                "default_page_limit must be positive".to_string(),
            ));
        }
        if config.retrieval_timeout.is_zero() {
            return Err(SavourError::ConfigError(
                "retrieval_timeout must be positive".to_string(),
            ));
        }
        if !config.relevance_weights.exact_dominates() {
            return Err(SavourError::ConfigError(
                "Exact match points must outscore every other match".to_string(),
            ));
        }
        Ok(DiscoverySearcher::from_parts(self.store, self.config))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        entity::{Cuisine, ItemEntity, VenueEntity},
        store::InMemoryEntityStore,
    };

    fn store() -> Arc<InMemoryEntityStore> {
        Arc::new(
            InMemoryEntityStore::from_entities([
                VenueEntity::new("v1", "Mama Put", Cuisine::Nigerian).into(),
                ItemEntity::new("i1", "v1", "Jollof Rice", 6.5).into(),
                ItemEntity::new("i2", "v1", "Suya", 4.0).into(),
            ])
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_search_bulk_preserves_order() {
        let searcher = DiscoverySearcher::new(store());
        let requests = [
            SearchRequest::new("suya"),
            SearchRequest::new("jollof"),
            SearchRequest::new("mama"),
        ];
        let responses = searcher.search_bulk(&requests).await;
        let names: Vec<Vec<&str>> = responses.iter().map(SearchResponse::names).collect();
        assert_eq!(
            names,
            vec![vec!["Suya"], vec!["Jollof Rice"], vec!["Mama Put"]]
        );
    }

    #[tokio::test]
    async fn test_search_with_config_uses_given_limits() {
        let searcher = DiscoverySearcher::new(store());
        let config = SearchConfig {
            default_page_limit: 1,
            ..SearchConfig::default()
        };
        let response = searcher
            .search_with_config(&SearchRequest::browse(), &config)
            .await;
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.total_matches, 3);
    }

    #[tokio::test]
    async fn test_clones_share_the_store() {
        let searcher = DiscoverySearcher::new(store());
        let clone = searcher.clone();
        assert!(Arc::ptr_eq(searcher.store(), clone.store()));
        assert_eq!(clone.search("suya").await.names(), vec!["Suya"]);
    }

    #[test]
    fn test_builder_rejects_unusable_config() {
        let zero_timeout = SearchConfig {
            retrieval_timeout: Duration::ZERO,
            ..SearchConfig::default()
        };
        let result = DiscoverySearcher::builder(store())
            .config(zero_timeout)
            .build();
        assert!(matches!(result, Err(SavourError::ConfigError(_))));

        let built = DiscoverySearcher::builder(store())
            .config(SearchConfig::builder().page_limit(5).build())
            .build()
            .unwrap();
        assert_eq!(built.config().default_page_limit, 5);
    }
}
