//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::catalog::RefreshReport;
use crate::domain::{Source, Station};
use crate::route::{Route, RouteError};

/// A station as shown to clients.
#[derive(Debug, Serialize)]
pub struct StationView {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub address: String,
    pub status: String,
    pub total_bikes: u32,
    pub ebikes: u32,
    pub regular_bikes: u32,
    pub source: Source,
}

impl StationView {
    pub fn from_station(station: &Station) -> Self {
        Self {
            id: station.id.to_string(),
            latitude: station.location.latitude,
            longitude: station.location.longitude,
            name: station.name.clone(),
            address: station.address.clone(),
            status: station.status.clone(),
            total_bikes: station.total_bikes(),
            ebikes: station.ebikes(),
            regular_bikes: station.regular_bikes(),
            source: station.source,
        }
    }
}

/// Response listing every station.
#[derive(Debug, Serialize)]
pub struct StationListResponse {
    pub stations: Vec<StationView>,
    pub last_refresh: Option<RefreshReport>,
}

/// The current route, in visiting order.
#[derive(Debug, Serialize)]
pub struct RouteView {
    pub stations: Vec<StationView>,
}

impl RouteView {
    pub fn from_route(route: &Route) -> Self {
        Self {
            stations: route
                .stations()
                .iter()
                .map(|s| StationView::from_station(s))
                .collect(),
        }
    }
}

/// Query for raw isochrones.
#[derive(Debug, Deserialize)]
pub struct IsochroneQuery {
    /// Comma-separated contour minutes, e.g. `10,20,30`
    pub contours: Option<String>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,

    /// Machine-readable reason for route rejections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,

    /// Minutes the rejected hop needs, for `too_far`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_minutes: Option<u32>,

    /// Policy limit in minutes, for `too_far`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_minutes: Option<u32>,
}

impl ErrorResponse {
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            reason: None,
            required_minutes: None,
            limit_minutes: None,
        }
    }

    pub fn from_route_error(err: &RouteError) -> Self {
        let mut body = Self::message(err.to_string());
        match err {
            RouteError::TooFar {
                required, limit, ..
            } => {
                body.reason = Some("too_far");
                body.required_minutes = Some(required.minutes());
                body.limit_minutes = Some(limit.minutes());
            }
            RouteError::AlreadySelected(_) => body.reason = Some("already_selected"),
            RouteError::Cancelled(_) => body.reason = Some("cancelled"),
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BikeCounts, Point, ReachabilityBudget, StationId};

    #[test]
    fn station_view_exposes_counts() {
        let station = Station {
            id: StationId::provider_a(1),
            location: Point::new(47.3769, 8.5417),
            name: "Hauptbahnhof".to_string(),
            address: "Bahnhofplatz".to_string(),
            status: "Active".to_string(),
            bikes: BikeCounts::new(1, 3),
            source: Source::Both,
        };

        let json = serde_json::to_value(StationView::from_station(&station)).unwrap();
        assert_eq!(json["id"], "a:1");
        assert_eq!(json["total_bikes"], 4);
        assert_eq!(json["ebikes"], 1);
        assert_eq!(json["regular_bikes"], 3);
        assert_eq!(json["source"], "both");
    }

    #[test]
    fn too_far_error_body() {
        let err = RouteError::TooFar {
            from: StationId::provider_a(1),
            to: StationId::provider_a(2),
            required: ReachabilityBudget::new(44).unwrap(),
            limit: ReachabilityBudget::DEFAULT_POLICY,
        };

        let json = serde_json::to_value(ErrorResponse::from_route_error(&err)).unwrap();
        assert_eq!(json["reason"], "too_far");
        assert_eq!(json["required_minutes"], 44);
        assert_eq!(json["limit_minutes"], 30);
    }

    #[test]
    fn plain_error_body_omits_details() {
        let json = serde_json::to_value(ErrorResponse::message("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "boom"}));
    }
}
