//! Straight-line distance between coordinates and the human-readable estimates derived from it.
//!
//! Nothing in here fails: invalid coordinates produce `NaN` distances, which callers are
//! expected to guard against (the pipeline treats a non-finite distance as "unknown").

use std::fmt;

use crate::entity::{Coordinate, SearchableEntity};

/// Mean Earth radius used by the spherical approximation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres using the haversine formula.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Keep the entities within `radius_km` of `center`, paired with their distance.
///
/// Entities without a coordinate, or whose distance cannot be computed, are left out.
pub fn within_radius<'a, I>(
    candidates: I,
    center: Coordinate,
    radius_km: f64,
) -> Vec<(&'a SearchableEntity, f64)>
where
    I: IntoIterator<Item = &'a SearchableEntity>,
{
    candidates
        .into_iter()
        .filter_map(|entity| {
            let km = distance_km(center, entity.coordinate()?);
            (km <= radius_km).then_some((entity, km))
        })
        .collect()
}

/// `"350 m"` below a kilometre, `"3.4 km"` below ten, `"27 km"` beyond.
pub fn format_distance(km: f64) -> String {
    if !km.is_finite() || km < 0.0 {
        return "unknown".to_string();
    }
    if km < 1.0 {
        format!("{} m", (km * 1000.0).round() as u64)
    } else if km < 10.0 {
        format!("{km:.1} km")
    } else {
        format!("{} km", km.round() as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum TravelMode {
    Walking,
    Driving,
}

impl TravelMode {
    /// Walk short hops, drive everything else.
    pub fn for_distance(km: f64, walking_threshold_km: f64) -> Self {
        if km < walking_threshold_km {
            Self::Walking
        } else {
            Self::Driving
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Walking => f.write_str("walk"),
            Self::Driving => f.write_str("drive"),
        }
    }
}

/// Assumed average speeds per travel mode, km/h.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TravelSpeeds {
    pub walking_kmh: f64,
    pub driving_kmh: f64,
}

impl Default for TravelSpeeds {
    fn default() -> Self {
        Self {
            walking_kmh: 5.0,
            driving_kmh: 30.0,
        }
    }
}

impl TravelSpeeds {
    pub const fn speed_for(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Walking => self.walking_kmh,
            TravelMode::Driving => self.driving_kmh,
        }
    }
}

/// Coarse travel time at the default speeds. Illustrative, not an ETA.
pub fn estimate_travel_time(km: f64, mode: TravelMode) -> String {
    estimate_travel_time_with(km, mode, &TravelSpeeds::default())
}

/// Like [`estimate_travel_time`] with explicit speeds, e.g. `"12 min walk"` or `"1 h 5 min drive"`.
pub fn estimate_travel_time_with(km: f64, mode: TravelMode, speeds: &TravelSpeeds) -> String {
    let speed = speeds.speed_for(mode);
    if !km.is_finite() || km < 0.0 || !speed.is_finite() || speed <= 0.0 {
        return "unknown".to_string();
    }
    let minutes = (km * 60.0 / speed).ceil().max(1.0) as u64;
    if minutes < 60 {
        format!("{minutes} min {mode}")
    } else {
        let (hours, rest) = (minutes / 60, minutes % 60);
        if rest == 0 {
            format!("{hours} h {mode}")
        } else {
            format!("{hours} h {rest} min {mode}")
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::entity::{Cuisine, ItemEntity, VenueEntity};

    const LAGOS: Coordinate = Coordinate::new(6.5244, 3.3792);
    const ACCRA: Coordinate = Coordinate::new(5.6037, -0.1870);

    #[test]
    fn test_known_distances() {
        // One degree of longitude on the equator.
        let km = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        assert!((km - 111.195).abs() < 0.01, "got {km}");

        let km = distance_km(LAGOS, ACCRA);
        assert!((km - 407.0).abs() < 15.0, "got {km}");
    }

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(distance_km(LAGOS, LAGOS), 0.0);
    }

    #[test]
    fn test_nan_propagates() {
        let km = distance_km(Coordinate::new(f64::NAN, 0.0), LAGOS);
        assert!(km.is_nan());
    }

    #[test]
    fn test_within_radius_excludes_unlocated_entities() {
        let near: SearchableEntity = VenueEntity::new("v1", "Near", Cuisine::Nigerian)
            .with_coordinate(Coordinate::new(0.0, 0.0))
            .into();
        let far: SearchableEntity = VenueEntity::new("v2", "Far", Cuisine::Nigerian)
            .with_coordinate(Coordinate::new(0.0, 1.0))
            .into();
        let unlocated: SearchableEntity = VenueEntity::new("v3", "Nowhere", Cuisine::Other).into();
        let item: SearchableEntity = ItemEntity::new("i1", "v1", "Suya", 5.0).into();
        let all = [near, far, unlocated, item];

        let hits = within_radius(&all, Coordinate::new(0.0, 0.0), 50.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.name(), "Near");
        assert_eq!(hits[0].1, 0.0);

        let hits = within_radius(&all, Coordinate::new(0.0, 0.0), 200.0);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(0.35), "350 m");
        assert_eq!(format_distance(3.42), "3.4 km");
        assert_eq!(format_distance(9.94), "9.9 km");
        assert_eq!(format_distance(27.6), "28 km");
        assert_eq!(format_distance(f64::NAN), "unknown");
    }

    #[test]
    fn test_travel_time_estimates() {
        assert_eq!(estimate_travel_time(1.0, TravelMode::Walking), "12 min walk");
        assert_eq!(estimate_travel_time(0.01, TravelMode::Walking), "1 min walk");
        assert_eq!(estimate_travel_time(15.0, TravelMode::Driving), "30 min drive");
        assert_eq!(estimate_travel_time(30.0, TravelMode::Driving), "1 h drive");
        assert_eq!(
            estimate_travel_time(32.5, TravelMode::Driving),
            "1 h 5 min drive"
        );
        assert_eq!(estimate_travel_time(f64::NAN, TravelMode::Driving), "unknown");
    }

    #[test]
    fn test_travel_mode_threshold() {
        assert_eq!(TravelMode::for_distance(0.8, 1.5), TravelMode::Walking);
        assert_eq!(TravelMode::for_distance(1.5, 1.5), TravelMode::Driving);
    }

    fn coordinate() -> impl Strategy<Value = Coordinate> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| Coordinate::new(lat, lon))
    }

    proptest! {
        #[test]
        fn prop_distance_is_symmetric(a in coordinate(), b in coordinate()) {
            prop_assert_eq!(distance_km(a, b), distance_km(b, a));
        }

        #[test]
        fn prop_distance_to_self_is_zero(a in coordinate()) {
            prop_assert_eq!(distance_km(a, a), 0.0);
        }

        #[test]
        fn prop_distance_is_bounded(a in coordinate(), b in coordinate()) {
            let km = distance_km(a, b);
            prop_assert!(km >= 0.0);
            prop_assert!(km <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }
    }
}
