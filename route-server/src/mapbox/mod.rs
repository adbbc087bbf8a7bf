//! Mapbox isochrone and directions client.
//!
//! Two Mapbox APIs back the route builder:
//! - the Isochrone API answers "where can I cycle to from here within N
//!   minutes?" as a set of polygons;
//! - the Directions API gives distance, duration and path geometry for a
//!   single cycling leg.
//!
//! Both are treated as external collaborators: their geometry is forwarded
//! untouched to whoever renders it.

mod client;
mod error;
mod types;

pub use client::{MapboxClient, MapboxConfig};
pub use error::MapboxError;
pub use types::{Directions, DirectionsResponse, DirectionsRoute};
