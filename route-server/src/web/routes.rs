//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use geojson::FeatureCollection;
use tracing::{info, warn};

use crate::domain::{ReachabilityBudget, StationId};
use crate::mapbox::MapboxError;
use crate::route::{RouteError, RoutePlan, plan_legs};

use super::dto::*;
use super::state::AppState;

/// Contours drawn when the client asks for none.
const DEFAULT_CONTOURS: [u32; 3] = [10, 20, 30];

/// Mapbox accepts at most four contours per isochrone.
const MAX_CONTOURS: usize = 4;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stations", get(list_stations))
        .route("/api/stations/:id/isochrone", get(station_isochrone))
        .route("/api/route", get(current_route).delete(clear_route))
        .route("/api/route/legs", get(route_legs))
        .route("/api/route/select/:id", post(select_station))
        .route("/api/route/deselect/:id", post(deselect_station))
        .route("/api/route/toggle/:id", post(toggle_station))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Every station in the catalog.
async fn list_stations(State(state): State<AppState>) -> Json<StationListResponse> {
    let stations = state
        .catalog
        .all()
        .await
        .iter()
        .map(|s| StationView::from_station(s))
        .collect();
    let last_refresh = state.catalog.last_report().await;

    Json(StationListResponse {
        stations,
        last_refresh,
    })
}

/// Raw isochrone polygons around a station.
async fn station_isochrone(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<IsochroneQuery>,
) -> Result<Json<FeatureCollection>, AppError> {
    let id = parse_id(&id)?;
    let contours = parse_contours(query.contours.as_deref())?;
    let station = state
        .catalog
        .get(&id)
        .await
        .ok_or_else(|| AppError::unknown_station(&id))?;

    let collection = state.mapbox.isochrone(station.location, &contours).await?;
    Ok(Json(collection))
}

/// The current route.
async fn current_route(State(state): State<AppState>) -> Json<RouteView> {
    Json(RouteView::from_route(&state.route.route()))
}

/// Append a station to the route.
async fn select_station(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RouteView>, AppError> {
    let id = parse_id(&id)?;
    let station = state
        .catalog
        .get(&id)
        .await
        .ok_or_else(|| AppError::unknown_station(&id))?;

    let route = state.route.try_append(station).await?;
    info!(station = %id, stops = route.len(), "station selected");
    Ok(Json(RouteView::from_route(&route)))
}

/// Remove a station from the route.
///
/// Works by id alone, so a station that has since left the catalog can
/// still be taken off the route.
async fn deselect_station(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RouteView>, AppError> {
    let id = parse_id(&id)?;
    let route = state.route.remove(&id).await?;
    info!(station = %id, stops = route.len(), "station deselected");
    Ok(Json(RouteView::from_route(&route)))
}

/// Select the station if it is off the route, deselect it otherwise.
///
/// A station that has left the catalog can only be toggled off.
async fn toggle_station(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RouteView>, AppError> {
    let id = parse_id(&id)?;

    if state.route.route().contains(&id) {
        let route = state.route.remove(&id).await?;
        return Ok(Json(RouteView::from_route(&route)));
    }

    let station = state
        .catalog
        .get(&id)
        .await
        .ok_or_else(|| AppError::unknown_station(&id))?;
    let route = state.route.toggle(station).await?;
    Ok(Json(RouteView::from_route(&route)))
}

/// Clear the route, cancelling any pending selection.
async fn clear_route(State(state): State<AppState>) -> Json<RouteView> {
    let route = state.route.clear();
    Json(RouteView::from_route(&route))
}

/// Cycling directions for each leg of the current route.
async fn route_legs(State(state): State<AppState>) -> Json<RoutePlan> {
    let route = state.route.route();
    Json(plan_legs(&route, state.mapbox.as_ref()).await)
}

fn parse_id(raw: &str) -> Result<StationId, AppError> {
    StationId::parse(raw).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })
}

/// Parse a comma-separated contour list, defaulting to 10, 20 and 30 minutes.
fn parse_contours(raw: Option<&str>) -> Result<Vec<u32>, AppError> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(DEFAULT_CONTOURS.to_vec());
    };

    let mut contours = raw
        .split(',')
        .map(|part| {
            let part = part.trim();
            let minutes: u32 = part.parse().map_err(|_| AppError::BadRequest {
                message: format!("Invalid contour: {part}"),
            })?;
            ReachabilityBudget::new(minutes)
                .map(ReachabilityBudget::minutes)
                .map_err(|e| AppError::BadRequest {
                    message: e.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    contours.sort_unstable();
    contours.dedup();

    if contours.len() > MAX_CONTOURS {
        return Err(AppError::BadRequest {
            message: format!("At most {MAX_CONTOURS} contours are allowed"),
        });
    }

    Ok(contours)
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Route(RouteError),
    Upstream { message: String },
}

impl AppError {
    fn unknown_station(id: &StationId) -> Self {
        AppError::NotFound {
            message: format!("Unknown station: {id}"),
        }
    }

    /// Status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Route(RouteError::TooFar { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Route(RouteError::AlreadySelected(_) | RouteError::Cancelled(_)) => {
                StatusCode::CONFLICT
            }
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<RouteError> for AppError {
    fn from(e: RouteError) -> Self {
        AppError::Route(e)
    }
}

impl From<MapboxError> for AppError {
    fn from(e: MapboxError) -> Self {
        AppError::Upstream {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = match &self {
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::Upstream { message } => ErrorResponse::message(message.clone()),
            AppError::Route(e) => ErrorResponse::from_route_error(e),
        };

        warn!(%status, error = %body.error, "request failed");

        (status, Json(body)).into_response()
    }
}
