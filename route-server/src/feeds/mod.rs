//! Station provider feeds.
//!
//! Two independent providers publish bike-share docks for the same city:
//!
//! - Provider A (PubliBike) reports numeric coordinates and one entry per
//!   parked vehicle.
//! - Provider B reports every numeric field as text and only aggregated
//!   electric / non-electric counts.
//!
//! Records are kept in their raw shapes here; the merger turns them into
//! canonical [`Station`](crate::domain::Station)s. Entries are decoded one
//! at a time, so a malformed entry is rejected without losing its feed.

mod client;
mod error;
mod types;

pub use client::{FeedClient, FeedConfig};
pub use error::FeedError;
pub use types::{
    FeedBatch, ProviderARecord, ProviderAState, ProviderAVehicle, ProviderBRecord, RejectedRecord,
    VehicleType,
};
