//! Domain types for the bike route builder.
//!
//! Like the rest of the crate, these types enforce their invariants at
//! construction time: a `ReachabilityBudget` is always inside its domain and
//! a `Station`'s bike total always equals the sum of its parts.

mod budget;
mod point;
mod station;

pub use budget::{InvalidBudget, ReachabilityBudget};
pub use point::{MergeKey, Point};
pub use station::{BikeCounts, InvalidStationId, Source, Station, StationId};
