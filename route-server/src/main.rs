use std::net::SocketAddr;

use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use route_server::catalog::{SnapshotCache, SnapshotConfig, StationCatalog};
use route_server::config::AppConfig;
use route_server::feeds::{FeedClient, FeedConfig};
use route_server::mapbox::{MapboxClient, MapboxConfig};
use route_server::reach::{CachedEstimator, DistanceEstimator, EstimatorCacheConfig, IsochroneOracle};
use route_server::route::RouteBuilder;
use route_server::web::{AppState, create_router};

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("route_server=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let config = AppConfig::from_env().expect("Invalid configuration");

    // Mapbox client, shared by the oracle and the directions endpoint
    let mut mapbox_config = MapboxConfig::new(&config.mapbox_api_key);
    if let Some(profile) = &config.mapbox_profile {
        mapbox_config = mapbox_config.with_profile(profile);
    }
    if let Some(n) = config.mapbox_max_concurrent {
        mapbox_config = mapbox_config.with_max_concurrent(n);
    }
    let mapbox = MapboxClient::new(mapbox_config).expect("Failed to create Mapbox client");

    // Station feeds
    let mut feed_config = FeedConfig::new();
    if let Some(url) = &config.provider_a_url {
        feed_config = feed_config.with_provider_a_url(url);
    }
    if let Some(url) = &config.provider_b_url {
        feed_config = feed_config.with_provider_b_url(url);
    }
    if let Some(key) = &config.provider_b_api_key {
        feed_config = feed_config.with_provider_b_api_key(key);
    }
    let feed_client = FeedClient::new(feed_config).expect("Failed to create feed client");
    if !feed_client.has_provider_b() {
        warn!("PROVIDER_B_URL not set, using provider A stations only");
    }

    let snapshot = config
        .snapshot_path
        .as_ref()
        .map(|path| SnapshotCache::new(SnapshotConfig::new(path)));

    // Fetch stations (fail fast if neither the feeds nor a snapshot are usable)
    info!("fetching stations");
    let catalog = StationCatalog::fetch(feed_client, snapshot)
        .await
        .expect("Failed to load stations");
    info!(stations = catalog.len().await, "station catalog ready");

    // Route builder over the cached isochrone estimator
    let oracle = IsochroneOracle::new(mapbox.clone());
    let estimator = CachedEstimator::new(
        DistanceEstimator::new(oracle),
        &EstimatorCacheConfig::default(),
    );
    let route = RouteBuilder::new(estimator, config.route.clone());

    let state = AppState::new(catalog, route, mapbox);

    // Spawn background task to refresh the catalog, dropping cached
    // estimates whenever the station set is replaced
    let refresh_state = state.clone();
    let refresh_interval = config.refresh_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh_interval);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match refresh_state.catalog.refresh().await {
                Ok(_) => {
                    let estimator = refresh_state.route.estimator();
                    debug!(
                        entries = estimator.cache_entry_count(),
                        "dropping cached budget estimates"
                    );
                    estimator.invalidate_cache();
                }
                Err(e) => {
                    error!(error = %e, "station refresh failed, keeping previous stations");
                }
            }
        }
    });

    let app = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    info!(
        %addr,
        budget = %config.route.budget_limit,
        removal_policy = ?config.route.removal_policy,
        "route server listening"
    );

    axum::serve(listener, app).await.expect("Server error");
}
