//! The read-only contract the core needs from whatever holds the catalog.
//!
//! Stores are untrusted for exact semantics: the pipeline re-applies every filter locally and
//! only relies on a store to narrow the candidate set cheaply.

use std::{future::Future, sync::Arc, time::Duration};

use tracing::debug;

pub use error::{Result, StoreError};

use crate::{
    entity::{EntityError, EntityKind, ItemEntity, SearchableEntity, VenueEntity},
    filter::{FilterCompositor, FilterSpec},
};

/// Source of candidate entities.
///
/// Both lookups may return an empty list and may fail with a [`StoreError`]; the pipeline turns
/// failures into its own error kinds together with the entity kind and lookup that failed.
pub trait EntityStore: Send + Sync {
    /// Entities of `kind` whose text matches `term` (substring/prefix semantics).
    fn find_by_text(
        &self,
        term: &str,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Vec<SearchableEntity>>> + Send;

    /// Entities of `kind` narrowed by whatever facets of `spec` the store can evaluate.
    fn find_by_facet(
        &self,
        spec: &FilterSpec,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Vec<SearchableEntity>>> + Send;
}

impl<S: EntityStore> EntityStore for Arc<S> {
    fn find_by_text(
        &self,
        term: &str,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Vec<SearchableEntity>>> + Send {
        (**self).find_by_text(term, kind)
    }

    fn find_by_facet(
        &self,
        spec: &FilterSpec,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Vec<SearchableEntity>>> + Send {
        (**self).find_by_facet(spec, kind)
    }
}

/// A catalog held in memory, answering lookups with linear scans.
///
/// Useful for tests, demos and small embedded catalogs. An optional artificial latency
/// simulates a remote store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityStore {
    venues: Vec<VenueEntity>,
    items: Vec<ItemEntity>,
    latency: Option<Duration>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store, rejecting any entity that breaks the snapshot invariants.
    pub fn from_entities(
        entities: impl IntoIterator<Item = SearchableEntity>,
    ) -> std::result::Result<Self, EntityError> {
        let mut store = Self::new();
        for entity in entities {
            store.insert(entity)?;
        }
        Ok(store)
    }

    pub fn insert(&mut self, entity: SearchableEntity) -> std::result::Result<(), EntityError> {
        entity.validate()?;
        match entity {
            SearchableEntity::Venue(venue) => self.venues.push(venue),
            SearchableEntity::Item(item) => self.items.push(item),
        }
        Ok(())
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn venues(&self) -> &[VenueEntity] {
        &self.venues
    }

    pub fn items(&self) -> &[ItemEntity] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.venues.len() + self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entities_of(&self, kind: EntityKind) -> Box<dyn Iterator<Item = SearchableEntity> + '_> {
        match kind {
            EntityKind::Venue => Box::new(self.venues.iter().cloned().map(SearchableEntity::Venue)),
            EntityKind::Item => Box::new(self.items.iter().cloned().map(SearchableEntity::Item)),
        }
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl EntityStore for InMemoryEntityStore {
    async fn find_by_text(&self, term: &str, kind: EntityKind) -> Result<Vec<SearchableEntity>> {
        self.simulate_latency().await;
        let needle = term.trim().to_lowercase();
        let found: Vec<SearchableEntity> = self
            .entities_of(kind)
            .filter(|entity| {
                [
                    Some(entity.name()),
                    Some(entity.description()),
                    entity.category_label(),
                    entity.region_label(),
                ]
                .into_iter()
                .flatten()
                .any(|text| text.to_lowercase().contains(&needle))
            })
            .collect();
        debug!(term, %kind, found = found.len(), "In-memory text lookup");
        Ok(found)
    }

    async fn find_by_facet(
        &self,
        spec: &FilterSpec,
        kind: EntityKind,
    ) -> Result<Vec<SearchableEntity>> {
        self.simulate_latency().await;
        let compositor = FilterCompositor::new(spec, None);
        let found: Vec<SearchableEntity> = self
            .entities_of(kind)
            .filter(|entity| compositor.matches(entity))
            .collect();
        debug!(%kind, found = found.len(), "In-memory facet lookup");
        Ok(found)
    }
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum StoreError {
        #[error("Store unavailable: {0}")]
        Unavailable(String),
        #[error("Store query failed: {0}")]
        Query(String),
        #[error(transparent)]
        Other(#[from] anyhow::Error),
    }
    pub type Result<T> = std::result::Result<T, StoreError>;
}
