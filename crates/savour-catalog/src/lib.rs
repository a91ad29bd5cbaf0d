//! Catalog snapshots for the Savour discovery search core.
//!
//! A [`CatalogSnapshot`] is the plain, serializable form of a catalog: every venue and every
//! menu item at one point in time. Snapshots load from JSON, check the invariants the search
//! core relies on, and turn into an [`InMemoryEntityStore`] ready to be searched.
//!
//! [`sample_catalog`] returns a small bundled catalog used by demos and integration tests.

use std::{fs, path::Path};

use ahash::AHashSet as HashSet;
use savour::{EntityId, EntityKind, InMemoryEntityStore, ItemEntity, SearchableEntity, VenueEntity};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

pub use error::{CatalogError, Result};

const SAMPLE_CATALOG_JSON: &str = include_str!("../data/sample_catalog.json");

/// Every venue and item of a catalog at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub venues: Vec<VenueEntity>,
    #[serde(default)]
    pub items: Vec<ItemEntity>,
}

impl CatalogSnapshot {
    pub fn new(venues: Vec<VenueEntity>, items: Vec<ItemEntity>) -> Self {
        Self { venues, items }
    }

    /// Parse and validate a JSON snapshot.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Read, parse and validate a JSON snapshot file.
    #[instrument(name = "Load catalog snapshot", level = "info")]
    pub fn from_path(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let snapshot = Self::from_json_str(&json)?;
        info!(
            venues = snapshot.venues.len(),
            items = snapshot.items.len(),
            "Catalog snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(From::from)
    }

    /// Check entity invariants, id uniqueness per kind and that every item's venue exists.
    pub fn validate(&self) -> Result<()> {
        let mut venue_ids: HashSet<&EntityId> = HashSet::with_capacity(self.venues.len());
        for venue in &self.venues {
            SearchableEntity::from(venue.clone()).validate()?;
            if !venue_ids.insert(&venue.id) {
                return Err(CatalogError::DuplicateId {
                    kind: EntityKind::Venue,
                    id: venue.id.clone(),
                });
            }
        }

        let mut item_ids: HashSet<&EntityId> = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            SearchableEntity::from(item.clone()).validate()?;
            if !item_ids.insert(&item.id) {
                return Err(CatalogError::DuplicateId {
                    kind: EntityKind::Item,
                    id: item.id.clone(),
                });
            }
            if !venue_ids.contains(&item.venue_id) {
                return Err(CatalogError::UnknownVenue {
                    item: item.id.clone(),
                    venue: item.venue_id.clone(),
                });
            }
        }
        debug!(
            venues = self.venues.len(),
            items = self.items.len(),
            "Catalog snapshot validated"
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.venues.len() + self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty() && self.items.is_empty()
    }

    /// Validate and load into a searchable in-memory store.
    pub fn into_store(self) -> Result<InMemoryEntityStore> {
        self.validate()?;
        let entities = self
            .venues
            .into_iter()
            .map(SearchableEntity::Venue)
            .chain(self.items.into_iter().map(SearchableEntity::Item));
        InMemoryEntityStore::from_entities(entities).map_err(From::from)
    }
}

/// The bundled sample catalog: a handful of West, East and Horn of Africa venues and dishes.
pub fn sample_catalog() -> Result<CatalogSnapshot> {
    CatalogSnapshot::from_json_str(SAMPLE_CATALOG_JSON)
}

mod error {
    use savour::{EntityError, EntityId, EntityKind};
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum CatalogError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
        #[error("Serialization error: {0}")]
        Json(#[from] serde_json::Error),
        #[error("Invalid entity: {0}")]
        Entity(#[from] EntityError),
        #[error("Duplicate {kind} id '{id}'")]
        DuplicateId { kind: EntityKind, id: EntityId },
        #[error("Item '{item}' references unknown venue '{venue}'")]
        UnknownVenue { item: EntityId, venue: EntityId },
    }

    pub type Result<T> = std::result::Result<T, CatalogError>;
}
