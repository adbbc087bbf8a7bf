//! Mapbox Directions API response DTOs.
//!
//! Isochrone responses are plain GeoJSON and are decoded with the `geojson`
//! crate instead.

use serde::{Deserialize, Serialize};

/// Response from the Directions API.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsResponse {
    /// `"Ok"` on success, otherwise an error code such as `"NoRoute"`.
    pub code: String,

    /// Candidate routes, best first.
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,

    /// Human-readable error message, if any.
    pub message: Option<String>,
}

/// A single route in a Directions response.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsRoute {
    /// Distance in meters.
    pub distance: f64,

    /// Expected travel time in seconds.
    pub duration: f64,

    /// GeoJSON LineString of the path, requested with `geometries=geojson`.
    pub geometry: serde_json::Value,
}

/// Distance, duration and path of one cycling leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Directions {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// Path geometry, forwarded untouched to the renderer.
    pub path_geometry: serde_json::Value,
}

impl From<DirectionsRoute> for Directions {
    fn from(route: DirectionsRoute) -> Self {
        Self {
            distance_meters: route.distance,
            duration_seconds: route.duration,
            path_geometry: route.geometry,
        }
    }
}
