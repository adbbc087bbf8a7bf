//! HTTP API for the route builder.
//!
//! A thin JSON layer: selection events go in, route snapshots come out.
//! Rendering is left entirely to the client.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, LiveEstimator};
