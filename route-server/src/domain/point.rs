//! Geographic points and the coordinate grid used to match stations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of grid cells per degree in a [`MergeKey`] (3 decimal places).
const MERGE_GRID_PER_DEGREE: f64 = 1000.0;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// The grid cell this point falls in, used to match stations across providers.
    pub fn merge_key(&self) -> MergeKey {
        MergeKey::from_point(*self)
    }
}

impl From<Point> for geo::Point<f64> {
    fn from(p: Point) -> Self {
        // geo uses (x, y) = (longitude, latitude)
        geo::Point::new(p.longitude, p.latitude)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Coordinates rounded to three decimal degrees (roughly a 111 m grid).
///
/// Two station records with equal keys are treated as the same physical dock.
///
/// ```
/// use route_server::domain::Point;
///
/// let a = Point::new(47.3769, 8.5417).merge_key();
/// let b = Point::new(47.3770, 8.5416).merge_key();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeKey {
    lat_cell: i64,
    lng_cell: i64,
}

impl MergeKey {
    pub fn from_point(p: Point) -> Self {
        Self {
            lat_cell: (p.latitude * MERGE_GRID_PER_DEGREE).round() as i64,
            lng_cell: (p.longitude * MERGE_GRID_PER_DEGREE).round() as i64,
        }
    }
}

impl fmt::Display for MergeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3},{:.3}",
            self.lat_cell as f64 / MERGE_GRID_PER_DEGREE,
            self.lng_cell as f64 / MERGE_GRID_PER_DEGREE
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearby_points_share_key() {
        let a = Point::new(47.3769, 8.5417);
        let b = Point::new(47.3770, 8.5416);
        assert_eq!(a.merge_key(), b.merge_key());
    }

    #[test]
    fn distant_points_differ() {
        let a = Point::new(47.3769, 8.5417);
        let b = Point::new(47.3790, 8.5417);
        assert_ne!(a.merge_key(), b.merge_key());
    }

    #[test]
    fn key_rounds_rather_than_truncates() {
        // 47.3766 rounds up to 47.377, truncation would give 47.376
        let a = Point::new(47.3766, 8.5400);
        let b = Point::new(47.3770, 8.5400);
        assert_eq!(a.merge_key(), b.merge_key());
    }

    #[test]
    fn negative_coordinates() {
        let a = Point::new(-33.8688, 151.2093);
        let b = Point::new(-33.8691, 151.2089);
        assert_eq!(a.merge_key(), b.merge_key());
        assert_eq!(a.merge_key().to_string(), "-33.869,151.209");
    }

    #[test]
    fn geo_point_axis_order() {
        let p: geo::Point<f64> = Point::new(47.0, 8.0).into();
        assert_eq!(p.x(), 8.0);
        assert_eq!(p.y(), 47.0);
    }

    #[test]
    fn finiteness() {
        assert!(Point::new(47.0, 8.0).is_finite());
        assert!(!Point::new(f64::NAN, 8.0).is_finite());
        assert!(!Point::new(47.0, f64::INFINITY).is_finite());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Points within 0.4 of a grid cell of a cell centre share its key
        #[test]
        fn jitter_within_cell_keeps_key(
            lat_cell in -89_000i64..89_000,
            lng_cell in -179_000i64..179_000,
            dlat in -0.0004f64..0.0004,
            dlng in -0.0004f64..0.0004,
        ) {
            let centre = Point::new(lat_cell as f64 / 1000.0, lng_cell as f64 / 1000.0);
            let jittered = Point::new(centre.latitude + dlat, centre.longitude + dlng);
            prop_assert_eq!(centre.merge_key(), jittered.merge_key());
        }
    }
}
