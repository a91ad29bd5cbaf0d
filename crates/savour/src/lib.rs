//! Savour - Discovery Search for Venues and Menu Items
//!
//! Savour is the search core behind a food-discovery app: given a free-text query, optional
//! structured filters and an optional searcher position, it returns a deterministic, ranked and
//! paginated list of venues and menu items, and it powers incremental autocomplete.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use savour::{
//!     Coordinate, Cuisine, DiscoverySearcher, FilterSpec, InMemoryEntityStore, SearchRequest,
//!     SortKey, VenueEntity,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), savour::error::SavourError> {
//! let store = InMemoryEntityStore::from_entities([
//!     VenueEntity::new("v1", "Suya Spot", Cuisine::Nigerian)
//!         .with_rating(4.7)
//!         .with_coordinate(Coordinate::new(6.45, 3.39))
//!         .into(),
//! ])?;
//! let searcher = DiscoverySearcher::new(Arc::new(store));
//!
//! let request = SearchRequest::new("suya")
//!     .with_location(Coordinate::new(6.46, 3.40))
//!     .with_filters(FilterSpec::new().min_rating(4.5).sort_by(SortKey::Distance, None));
//! let response = searcher.search_request(&request).await;
//! for result in &response.results {
//!     println!("{} ({:?})", result.name(), result.distance_label);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Relevance scoring**: tiered exact / prefix / substring matching with a whole-word bonus
//! - **Facet filtering**: cuisine, rating, price, distance, spice level, diet and availability
//! - **Geo distance**: haversine distances with human-readable labels and travel estimates
//! - **Autocomplete**: deduplicated suggestions across venues, dishes, cuisines and regions
//! - **Sessions**: a newer query supersedes an older in-flight one
//!
//! The catalog itself lives behind the [`EntityStore`] trait; [`InMemoryEntityStore`] is
//! provided for tests and small embedded catalogs.
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
mod core;
mod entity;
pub mod error;
mod filter;
mod geo;
mod relevance;
mod search;
mod store;

pub use crate::core::{DiscoverySearcher, DiscoverySearcherBuilder};

pub use config::{RelevanceScoringBuilder, SearchConfigBuilder};
pub use entity::{
    Coordinate, Cuisine, EntityError, EntityId, EntityKind, EntityScope, ItemEntity,
    SearchableEntity, VenueEntity,
};
pub use filter::{FilterCompositor, FilterSpec, SortDirection, SortKey};
pub use geo::{
    EARTH_RADIUS_KM, TravelMode, TravelSpeeds, distance_km, estimate_travel_time,
    estimate_travel_time_with, format_distance, within_radius,
};
pub use relevance::{FieldWeights, NormalizedQuery, RelevanceScorer, RelevanceWeights, TextField};
pub use search::{
    HARD_PAGE_CAP, PageWindow, RankingPipeline, RecentSearches, RetrievalStep, ScoredResult,
    SearchConfig, SearchError, SearchPage, SearchRequest, SearchResponse, SearchSession,
    Suggestion, SuggestionIndex, SuggestionKind, SuggestionResponse, rank_candidates,
};
pub use store::{EntityStore, InMemoryEntityStore, StoreError};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the Savour library.
///
/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG` when set, otherwise by `level`.
/// Only the first call has any effect.
///
/// ```rust
/// use savour::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), savour::error::SavourError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::SavourError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("rayon_core=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn setup_test_env() {
        let _ = init_logging(tracing::Level::WARN);
    }

    fn searcher() -> DiscoverySearcher<InMemoryEntityStore> {
        let store = InMemoryEntityStore::from_entities([
            VenueEntity::new("v1", "Buka Hut", Cuisine::Nigerian)
                .with_rating(4.4)
                .into(),
            ItemEntity::new("i1", "v1", "Egusi Soup", 8.0)
                .with_category("Soup")
                .into(),
        ])
        .unwrap();
        DiscoverySearcher::new(Arc::new(store))
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        setup_test_env();
        assert!(init_logging(tracing::Level::DEBUG).is_ok());
    }

    #[tokio::test]
    async fn test_basic_search() {
        setup_test_env();

        let response = searcher().search("egusi").await;
        assert!(response.success);
        assert_eq!(response.names(), vec!["Egusi Soup"]);
    }

    #[tokio::test]
    async fn test_configuration() {
        setup_test_env();

        let config = SearchConfigBuilder::fast().page_limit(1).build();
        let response = searcher()
            .search_with_config(&SearchRequest::browse(), &config)
            .await;
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.total_matches, 2);
    }

    #[tokio::test]
    async fn test_empty_search() {
        setup_test_env();

        let searcher = searcher();
        let response = searcher.search("").await;
        assert!(response.success, "Empty search should browse, not error");
        assert_eq!(response.total_matches, 2);

        let response = searcher.search("XYZ123NONEXISTENT").await;
        assert!(response.success);
        assert!(response.results.is_empty());
    }
}
