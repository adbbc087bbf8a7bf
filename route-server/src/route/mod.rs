//! The reachability-constrained route builder.
//!
//! A route is an ordered list of stations to visit. A station may only be
//! appended if it is reachable from the current last stop within the policy
//! budget; removal can happen anywhere. Whether a removal re-checks the new
//! adjacency it creates is a [`RemovalPolicy`] choice.

mod builder;
mod config;
mod error;
mod legs;
mod model;

pub use builder::RouteBuilder;
pub use config::{InvalidRemovalPolicy, RemovalPolicy, RouteConfig};
pub use error::RouteError;
pub use legs::{DirectionsProvider, LegSummary, RoutePlan, plan_legs};
pub use model::Route;
