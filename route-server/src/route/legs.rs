//! Per-leg distance and duration for a route.

use std::future::Future;

use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

use crate::domain::{Point, StationId};
use crate::mapbox::{Directions, MapboxClient, MapboxError};

use super::model::Route;

/// Source of cycling directions between two points.
pub trait DirectionsProvider: Send + Sync {
    fn directions(
        &self,
        origin: Point,
        destination: Point,
    ) -> impl Future<Output = Result<Directions, MapboxError>> + Send;
}

impl DirectionsProvider for MapboxClient {
    async fn directions(
        &self,
        origin: Point,
        destination: Point,
    ) -> Result<Directions, MapboxError> {
        MapboxClient::directions(self, origin, destination).await
    }
}

/// One leg of a route. `directions` is `None` when the lookup failed.
#[derive(Debug, Clone, Serialize)]
pub struct LegSummary {
    pub from: StationId,
    pub to: StationId,
    pub directions: Option<Directions>,
    pub error: Option<String>,
}

/// Directions for every leg of a route.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    pub legs: Vec<LegSummary>,
    /// Sum over the legs with directions.
    pub total_distance_meters: f64,
    /// Sum over the legs with directions.
    pub total_duration_seconds: f64,
    /// Whether every leg has directions.
    pub complete: bool,
}

/// Fetch directions for each consecutive pair of `route`.
///
/// Legs are fetched concurrently. A failed leg is reported without
/// directions rather than failing the whole plan.
pub async fn plan_legs<P: DirectionsProvider>(route: &Route, provider: &P) -> RoutePlan {
    let lookups = route.pairs().map(|(from, to)| async move {
        match provider.directions(from.location, to.location).await {
            Ok(directions) => LegSummary {
                from: from.id.clone(),
                to: to.id.clone(),
                directions: Some(directions),
                error: None,
            },
            Err(e) => {
                warn!(from = %from.id, to = %to.id, error = %e, "directions lookup failed");
                LegSummary {
                    from: from.id.clone(),
                    to: to.id.clone(),
                    directions: None,
                    error: Some(e.to_string()),
                }
            }
        }
    });

    let legs = join_all(lookups).await;

    let available = legs.iter().filter_map(|leg| leg.directions.as_ref());
    let (total_distance_meters, total_duration_seconds) = available
        .fold((0.0, 0.0), |(d, t), dir| {
            (d + dir.distance_meters, t + dir.duration_seconds)
        });
    let complete = legs.iter().all(|leg| leg.directions.is_some());

    RoutePlan {
        legs,
        total_distance_meters,
        total_duration_seconds,
        complete,
    }
}
