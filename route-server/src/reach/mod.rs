//! Reachability: can a cyclist get from one station to another in time?
//!
//! - [`ReachabilityOracle`] answers a yes/no question for one budget.
//! - [`search_minimal_budget`] binary-searches the budget domain for the
//!   smallest budget the oracle confirms, relying on reachability being
//!   monotonic in the budget.
//! - [`DistanceEstimator`] and [`CachedEstimator`] apply that search to
//!   pairs of stations.

mod cache;
mod estimator;
mod oracle;

pub use cache::{CachedEstimator, EstimatorCacheConfig};
pub use estimator::{BudgetEstimator, DistanceEstimator, search_minimal_budget};
pub use oracle::{IsochroneOracle, ReachabilityOracle, collection_contains};
