//! Canonical station catalog.
//!
//! Holds the merged station set, fetched from both provider feeds at
//! startup and replaced wholesale on every periodic refresh. An optional
//! on-disk snapshot lets the server start when the feeds are down.

mod snapshot;
mod store;

pub use snapshot::{SnapshotCache, SnapshotConfig, SnapshotError};
pub use store::{CatalogError, RefreshReport, StationCatalog};
