//! Catalog entities: venues, menu items and the values they carry.
//!
//! Entities are immutable snapshots handed to the core by an [`EntityStore`](crate::EntityStore)
//! for the duration of a single call. The core reads them, scores them and drops them; it never
//! mutates or persists them.

use std::{fmt, str::FromStr};

pub use error::{EntityError, Result};

/// Upper bound shared by ratings and spice levels.
pub const MAX_RATING: f64 = 5.0;
pub const MAX_SPICE_LEVEL: u8 = 5;

/// A WGS-84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components finite and inside the usual degree ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Opaque identifier, unique within one [`EntityKind`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum EntityKind {
    Venue,
    Item,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Venue => "venue",
            Self::Item => "item",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which entity kinds a request retrieves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum EntityScope {
    #[default]
    All,
    Venues,
    Items,
}

impl EntityScope {
    pub const fn kinds(self) -> &'static [EntityKind] {
        match self {
            Self::All => &[EntityKind::Venue, EntityKind::Item],
            Self::Venues => &[EntityKind::Venue],
            Self::Items => &[EntityKind::Item],
        }
    }

    pub fn includes(self, kind: EntityKind) -> bool {
        self.kinds().contains(&kind)
    }
}

/// The fixed set of cuisine categories a venue can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cuisine {
    African,
    Nigerian,
    Ghanaian,
    Ethiopian,
    Senegalese,
    Moroccan,
    Kenyan,
    SouthAfrican,
    Caribbean,
    Italian,
    Chinese,
    Indian,
    Japanese,
    Mexican,
    MiddleEastern,
    American,
    Other,
}

impl Cuisine {
    pub const ALL: [Self; 17] = [
        Self::African,
        Self::Nigerian,
        Self::Ghanaian,
        Self::Ethiopian,
        Self::Senegalese,
        Self::Moroccan,
        Self::Kenyan,
        Self::SouthAfrican,
        Self::Caribbean,
        Self::Italian,
        Self::Chinese,
        Self::Indian,
        Self::Japanese,
        Self::Mexican,
        Self::MiddleEastern,
        Self::American,
        Self::Other,
    ];

    /// Human-readable label, also used as the searchable category text.
    pub const fn label(self) -> &'static str {
        match self {
            Self::African => "African",
            Self::Nigerian => "Nigerian",
            Self::Ghanaian => "Ghanaian",
            Self::Ethiopian => "Ethiopian",
            Self::Senegalese => "Senegalese",
            Self::Moroccan => "Moroccan",
            Self::Kenyan => "Kenyan",
            Self::SouthAfrican => "South African",
            Self::Caribbean => "Caribbean",
            Self::Italian => "Italian",
            Self::Chinese => "Chinese",
            Self::Indian => "Indian",
            Self::Japanese => "Japanese",
            Self::Mexican => "Mexican",
            Self::MiddleEastern => "Middle Eastern",
            Self::American => "American",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Cuisine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Cuisine {
    type Err = EntityError;

    /// Case-insensitive; accepts the label with or without spaces/underscores.
    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        Self::ALL
            .into_iter()
            .find(|cuisine| cuisine.label().replace(' ', "").to_lowercase() == wanted)
            .ok_or_else(|| EntityError::UnknownCuisine(s.to_string()))
    }
}

/// A restaurant, stall or other place that serves items.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VenueEntity {
    pub id: EntityId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    /// 0 means unrated
    #[cfg_attr(feature = "serde", serde(default))]
    pub rating: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub available: bool,
    pub cuisine: Cuisine,
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub open: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub coordinate: Option<Coordinate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub address: String,
}

impl VenueEntity {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, cuisine: Cuisine) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            rating: 0.0,
            available: true,
            cuisine,
            open: true,
            coordinate: None,
            address: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }
}

/// A single dish or product on a venue's menu.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemEntity {
    pub id: EntityId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub rating: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub available: bool,
    pub venue_id: EntityId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: String,
    /// Region the dish originates from, e.g. "Ethiopia"
    #[cfg_attr(feature = "serde", serde(default))]
    pub origin: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub spice_level: u8,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vegetarian: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vegan: bool,
    pub price: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub calories: Option<u32>,
}

impl ItemEntity {
    pub fn new(
        id: impl Into<EntityId>,
        venue_id: impl Into<EntityId>,
        name: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            rating: 0.0,
            available: true,
            venue_id: venue_id.into(),
            category: String::new(),
            origin: None,
            spice_level: 0,
            vegetarian: false,
            vegan: false,
            price,
            calories: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_spice_level(mut self, level: u8) -> Self {
        self.spice_level = level;
        self
    }

    /// Vegan implies vegetarian.
    pub fn with_diet(mut self, vegetarian: bool, vegan: bool) -> Self {
        self.vegetarian = vegetarian || vegan;
        self.vegan = vegan;
        self
    }

    pub fn with_calories(mut self, calories: u32) -> Self {
        self.calories = Some(calories);
        self
    }

    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }
}

#[cfg(feature = "serde")]
const fn default_true() -> bool {
    true
}

/// Either kind of catalog entity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum SearchableEntity {
    Venue(VenueEntity),
    Item(ItemEntity),
}

impl SearchableEntity {
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Venue(_) => EntityKind::Venue,
            Self::Item(_) => EntityKind::Item,
        }
    }

    pub const fn id(&self) -> &EntityId {
        match self {
            Self::Venue(v) => &v.id,
            Self::Item(i) => &i.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Venue(v) => &v.name,
            Self::Item(i) => &i.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Venue(v) => &v.description,
            Self::Item(i) => &i.description,
        }
    }

    pub const fn rating(&self) -> f64 {
        match self {
            Self::Venue(v) => v.rating,
            Self::Item(i) => i.rating,
        }
    }

    pub const fn is_available(&self) -> bool {
        match self {
            Self::Venue(v) => v.available,
            Self::Item(i) => i.available,
        }
    }

    /// Only venues are located.
    pub const fn coordinate(&self) -> Option<Coordinate> {
        match self {
            Self::Venue(v) => v.coordinate,
            Self::Item(_) => None,
        }
    }

    /// Only items are priced.
    pub const fn price(&self) -> Option<f64> {
        match self {
            Self::Venue(_) => None,
            Self::Item(i) => Some(i.price),
        }
    }

    /// Cuisine label for venues, category tag for items.
    pub fn category_label(&self) -> Option<&str> {
        match self {
            Self::Venue(v) => Some(v.cuisine.label()),
            Self::Item(i) => non_empty(&i.category),
        }
    }

    /// Address for venues, origin region for items.
    pub fn region_label(&self) -> Option<&str> {
        match self {
            Self::Venue(v) => non_empty(&v.address),
            Self::Item(i) => i.origin.as_deref().and_then(non_empty),
        }
    }

    pub const fn as_venue(&self) -> Option<&VenueEntity> {
        match self {
            Self::Venue(v) => Some(v),
            Self::Item(_) => None,
        }
    }

    pub const fn as_item(&self) -> Option<&ItemEntity> {
        match self {
            Self::Venue(_) => None,
            Self::Item(i) => Some(i),
        }
    }

    /// Check the snapshot invariants: rating in [0, 5], price finite and non-negative,
    /// spice level in [0, 5].
    pub fn validate(&self) -> Result<()> {
        let rating = self.rating();
        if !(0.0..=MAX_RATING).contains(&rating) {
            return Err(EntityError::RatingOutOfRange {
                id: self.id().clone(),
                rating,
            });
        }
        match self {
            Self::Venue(v) => {
                if let Some(coordinate) = v.coordinate
                    && !coordinate.is_valid()
                {
                    return Err(EntityError::InvalidCoordinate {
                        id: v.id.clone(),
                        coordinate,
                    });
                }
            }
            Self::Item(i) => {
                if !i.price.is_finite() || i.price < 0.0 {
                    return Err(EntityError::InvalidPrice {
                        id: i.id.clone(),
                        price: i.price,
                    });
                }
                if i.spice_level > MAX_SPICE_LEVEL {
                    return Err(EntityError::SpiceOutOfRange {
                        id: i.id.clone(),
                        level: i.spice_level,
                    });
                }
            }
        }
        Ok(())
    }
}

impl From<VenueEntity> for SearchableEntity {
    fn from(value: VenueEntity) -> Self {
        Self::Venue(value)
    }
}

impl From<ItemEntity> for SearchableEntity {
    fn from(value: ItemEntity) -> Self {
        Self::Item(value)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

mod error {
    use thiserror::Error;

    use super::{Coordinate, EntityId};

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum EntityError {
        #[error("Rating {rating} of '{id}' is outside [0, 5]")]
        RatingOutOfRange { id: EntityId, rating: f64 },
        #[error("Price {price} of '{id}' must be a non-negative number")]
        InvalidPrice { id: EntityId, price: f64 },
        #[error("Spice level {level} of '{id}' is outside [0, 5]")]
        SpiceOutOfRange { id: EntityId, level: u8 },
        #[error("Coordinate {coordinate} of '{id}' is not a valid position")]
        InvalidCoordinate { id: EntityId, coordinate: Coordinate },
        #[error("Unknown cuisine '{0}'")]
        UnknownCuisine(String),
    }
    pub type Result<T> = std::result::Result<T, EntityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuisine_parsing_is_case_insensitive() {
        assert_eq!("ethiopian".parse::<Cuisine>().unwrap(), Cuisine::Ethiopian);
        assert_eq!(
            "south african".parse::<Cuisine>().unwrap(),
            Cuisine::SouthAfrican
        );
        assert_eq!(
            "MIDDLE_EASTERN".parse::<Cuisine>().unwrap(),
            Cuisine::MiddleEastern
        );
        assert!("martian".parse::<Cuisine>().is_err());
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(6.5244, 3.3792).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
    }

    #[test]
    fn test_entity_accessors_are_kind_aware() {
        let venue: SearchableEntity = VenueEntity::new("v1", "Mama Put", Cuisine::Nigerian)
            .with_address("Lagos Island")
            .with_coordinate(Coordinate::new(6.45, 3.39))
            .into();
        let item: SearchableEntity = ItemEntity::new("i1", "v1", "Jollof Rice", 8.5)
            .with_category("Mains")
            .with_origin("Nigeria")
            .into();

        assert_eq!(venue.kind(), EntityKind::Venue);
        assert_eq!(venue.category_label(), Some("Nigerian"));
        assert_eq!(venue.region_label(), Some("Lagos Island"));
        assert!(venue.price().is_none());
        assert!(venue.coordinate().is_some());

        assert_eq!(item.kind(), EntityKind::Item);
        assert_eq!(item.category_label(), Some("Mains"));
        assert_eq!(item.region_label(), Some("Nigeria"));
        assert_eq!(item.price(), Some(8.5));
        assert!(item.coordinate().is_none());
    }

    #[test]
    fn test_validate_rejects_broken_invariants() {
        let rating: SearchableEntity = VenueEntity::new("v1", "Too Good", Cuisine::Other)
            .with_rating(5.5)
            .into();
        assert!(matches!(
            rating.validate(),
            Err(EntityError::RatingOutOfRange { .. })
        ));

        let price: SearchableEntity = ItemEntity::new("i1", "v1", "Free Lunch", -1.0).into();
        assert!(matches!(
            price.validate(),
            Err(EntityError::InvalidPrice { .. })
        ));

        let spice: SearchableEntity = ItemEntity::new("i2", "v1", "Ghost Pepper Soup", 4.0)
            .with_spice_level(9)
            .into();
        assert!(matches!(
            spice.validate(),
            Err(EntityError::SpiceOutOfRange { .. })
        ));

        let ok: SearchableEntity = ItemEntity::new("i3", "v1", "Suya", 6.0)
            .with_rating(4.0)
            .with_spice_level(4)
            .into();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_vegan_implies_vegetarian() {
        let item = ItemEntity::new("i1", "v1", "Misir Wot", 9.0).with_diet(false, true);
        assert!(item.vegan);
        assert!(item.vegetarian);
    }

    #[test]
    fn test_scope_kinds() {
        assert_eq!(EntityScope::default(), EntityScope::All);
        assert!(EntityScope::All.includes(EntityKind::Item));
        assert!(!EntityScope::Venues.includes(EntityKind::Item));
        assert_eq!(EntityScope::Items.kinds(), &[EntityKind::Item]);
    }
}
