//! Application state for the web layer.

use std::sync::Arc;

use crate::catalog::StationCatalog;
use crate::mapbox::MapboxClient;
use crate::reach::{CachedEstimator, DistanceEstimator, IsochroneOracle};
use crate::route::RouteBuilder;

/// Estimator used by the running server.
pub type LiveEstimator = CachedEstimator<DistanceEstimator<IsochroneOracle>>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Canonical station set
    pub catalog: StationCatalog,

    /// The route being built
    pub route: Arc<RouteBuilder<LiveEstimator>>,

    /// Mapbox client for directions and raw isochrones
    pub mapbox: Arc<MapboxClient>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        catalog: StationCatalog,
        route: RouteBuilder<LiveEstimator>,
        mapbox: MapboxClient,
    ) -> Self {
        Self {
            catalog,
            route: Arc::new(route),
            mapbox: Arc::new(mapbox),
        }
    }
}
