//! Structured facet filters and the compositor that applies them.
//!
//! Every populated field of a [`FilterSpec`] is an independent predicate and all of them must
//! hold. Predicates are kind-aware: item facets are never evaluated against venues and venue
//! facets are never evaluated against items.

use crate::{
    entity::{Coordinate, Cuisine, EntityScope, ItemEntity, SearchableEntity, VenueEntity},
    geo,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum SortKey {
    Relevance,
    Rating,
    Price,
    Name,
    Distance,
}

impl SortKey {
    /// Best-first for scores, smallest-first for everything else.
    pub const fn default_direction(self) -> SortDirection {
        match self {
            Self::Relevance | Self::Rating => SortDirection::Descending,
            Self::Price | Self::Name | Self::Distance => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Optional facet constraints for a single query. Absent fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct FilterSpec {
    pub cuisine: Option<Cuisine>,
    /// Inclusive
    pub min_rating: Option<f64>,
    /// Inclusive, items only
    pub max_price: Option<f64>,
    /// Only applies together with a searcher location
    pub max_distance_km: Option<f64>,
    pub spice_level: Option<u8>,
    pub vegetarian_only: bool,
    pub vegan_only: bool,
    pub open_only: bool,
    pub available_only: bool,
    pub category: Option<String>,
    pub sort_by: Option<SortKey>,
    pub sort_direction: Option<SortDirection>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cuisine(mut self, cuisine: Cuisine) -> Self {
        self.cuisine = Some(cuisine);
        self
    }

    pub fn min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    pub fn max_price(mut self, price: f64) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn max_distance_km(mut self, km: f64) -> Self {
        self.max_distance_km = Some(km);
        self
    }

    pub fn spice_level(mut self, level: u8) -> Self {
        self.spice_level = Some(level);
        self
    }

    pub fn vegetarian_only(mut self) -> Self {
        self.vegetarian_only = true;
        self
    }

    pub fn vegan_only(mut self) -> Self {
        self.vegan_only = true;
        self
    }

    pub fn open_only(mut self) -> Self {
        self.open_only = true;
        self
    }

    pub fn available_only(mut self) -> Self {
        self.available_only = true;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn sort_by(mut self, key: SortKey, direction: Option<SortDirection>) -> Self {
        self.sort_by = Some(key);
        self.sort_direction = direction;
        self
    }

    /// Any facet that only makes sense for menu items is populated.
    pub fn has_item_facets(&self) -> bool {
        self.max_price.is_some()
            || self.spice_level.is_some()
            || self.vegetarian_only
            || self.vegan_only
            || self.category.is_some()
    }

    /// Any facet that only makes sense for venues is populated.
    pub const fn has_venue_facets(&self) -> bool {
        self.cuisine.is_some() || self.open_only
    }

    /// Whether any entity in `scope` could satisfy these facets.
    ///
    /// Asking for item facets while only retrieving venues (or the reverse) can never match.
    pub fn can_match(&self, scope: EntityScope) -> bool {
        match scope {
            EntityScope::All => true,
            EntityScope::Venues => !self.has_item_facets(),
            EntityScope::Items => !self.has_venue_facets(),
        }
    }

    /// Numeric bounds must be usable numbers.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(rating) = self.min_rating
            && !rating.is_finite()
        {
            return Err(format!("min_rating must be finite, got {rating}"));
        }
        if let Some(price) = self.max_price
            && (!price.is_finite() || price < 0.0)
        {
            return Err(format!("max_price must be a non-negative number, got {price}"));
        }
        if let Some(km) = self.max_distance_km
            && (!km.is_finite() || km < 0.0)
        {
            return Err(format!(
                "max_distance_km must be a non-negative number, got {km}"
            ));
        }
        Ok(())
    }
}

/// Applies a [`FilterSpec`] to candidate entities.
#[derive(Debug, Clone, Copy)]
pub struct FilterCompositor<'a> {
    spec: &'a FilterSpec,
    searcher: Option<Coordinate>,
}

impl<'a> FilterCompositor<'a> {
    pub const fn new(spec: &'a FilterSpec, searcher: Option<Coordinate>) -> Self {
        Self { spec, searcher }
    }

    pub fn apply(
        &self,
        candidates: impl IntoIterator<Item = SearchableEntity>,
    ) -> Vec<SearchableEntity> {
        candidates
            .into_iter()
            .filter(|entity| self.matches(entity))
            .collect()
    }

    pub fn matches(&self, entity: &SearchableEntity) -> bool {
        let spec = self.spec;
        if let Some(min) = spec.min_rating
            && entity.rating() < min
        {
            return false;
        }
        if spec.available_only && !entity.is_available() {
            return false;
        }
        if !self.within_distance(entity) {
            return false;
        }
        match entity {
            SearchableEntity::Venue(venue) => self.venue_matches(venue),
            SearchableEntity::Item(item) => self.item_matches(item),
        }
    }

    /// No-op unless both a searcher location and a distance bound are present.
    fn within_distance(&self, entity: &SearchableEntity) -> bool {
        let (Some(center), Some(max_km)) = (self.searcher, self.spec.max_distance_km) else {
            return true;
        };
        !geo::within_radius([entity], center, max_km).is_empty()
    }

    fn venue_matches(&self, venue: &VenueEntity) -> bool {
        let spec = self.spec;
        spec.cuisine.is_none_or(|cuisine| venue.cuisine == cuisine)
            && (!spec.open_only || venue.open)
    }

    fn item_matches(&self, item: &ItemEntity) -> bool {
        let spec = self.spec;
        spec.max_price.is_none_or(|max| item.price <= max)
            && spec.spice_level.is_none_or(|level| item.spice_level == level)
            && (!spec.vegetarian_only || item.vegetarian || item.vegan)
            && (!spec.vegan_only || item.vegan)
            && spec
                .category
                .as_deref()
                .is_none_or(|category| item.category.trim().eq_ignore_ascii_case(category.trim()))
    }
}
