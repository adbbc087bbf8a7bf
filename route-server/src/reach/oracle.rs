//! Reachability oracle backed by isochrone polygons.

use std::future::Future;

use geo::{Contains, Coord, LineString, MultiPolygon, Polygon};
use geojson::FeatureCollection;
use tracing::{debug, warn};

use crate::domain::{Point, ReachabilityBudget};
use crate::mapbox::MapboxClient;

/// Answers whether `destination` can be reached from `origin` within a budget.
///
/// Implementations never fail: any error talking to the backing service is
/// reported as "not reachable".
pub trait ReachabilityOracle: Send + Sync {
    fn is_reachable(
        &self,
        origin: Point,
        destination: Point,
        budget: ReachabilityBudget,
    ) -> impl Future<Output = bool> + Send;
}

/// Oracle that fetches one isochrone per probe and tests containment.
#[derive(Debug, Clone)]
pub struct IsochroneOracle {
    client: MapboxClient,
}

impl IsochroneOracle {
    pub fn new(client: MapboxClient) -> Self {
        Self { client }
    }
}

impl ReachabilityOracle for IsochroneOracle {
    async fn is_reachable(
        &self,
        origin: Point,
        destination: Point,
        budget: ReachabilityBudget,
    ) -> bool {
        match self.client.isochrone(origin, &[budget.minutes()]).await {
            Ok(collection) => {
                let reachable = collection_contains(&collection, destination);
                debug!(%origin, %destination, %budget, reachable, "isochrone probe");
                reachable
            }
            Err(e) => {
                warn!(error = %e, %origin, %budget, "isochrone request failed, treating as unreachable");
                false
            }
        }
    }
}

/// Whether any polygon in the collection contains `point`.
///
/// Non-polygon geometries are ignored. Points exactly on a boundary count as
/// outside.
pub fn collection_contains(collection: &FeatureCollection, point: Point) -> bool {
    let point: geo::Point<f64> = point.into();
    collection
        .features
        .iter()
        .filter_map(|feature| feature.geometry.as_ref())
        .filter_map(|geometry| to_multi_polygon(&geometry.value))
        .any(|polygons| polygons.contains(&point))
}

/// Convert a GeoJSON polygonal geometry to a geo `MultiPolygon`.
fn to_multi_polygon(value: &geojson::Value) -> Option<MultiPolygon<f64>> {
    match value {
        geojson::Value::Polygon(rings) => to_polygon(rings).map(|p| MultiPolygon::new(vec![p])),
        geojson::Value::MultiPolygon(polygons) => {
            let polygons: Vec<Polygon<f64>> =
                polygons.iter().filter_map(|rings| to_polygon(rings)).collect();
            (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
        }
        _ => None,
    }
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    Some(Polygon::new(
        to_line_string(exterior),
        interiors.iter().map(|r| to_line_string(r)).collect(),
    ))
}

fn to_line_string(coords: &[Vec<f64>]) -> LineString<f64> {
    LineString::new(
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| Coord { x: c[0], y: c[1] })
            .collect(),
    )
}
