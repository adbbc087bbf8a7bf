//! Route operation errors.

use crate::domain::{ReachabilityBudget, StationId};

/// Why a route operation was rejected. The route is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The new adjacent pair would exceed the policy budget
    #[error("station {to} is too far from {from}: needs {required}, limit is {limit}")]
    TooFar {
        from: StationId,
        to: StationId,
        required: ReachabilityBudget,
        limit: ReachabilityBudget,
    },

    /// The station is already on the route
    #[error("station {0} is already on the route")]
    AlreadySelected(StationId),

    /// The route changed while the operation was waiting on the oracle
    #[error("operation on station {0} was cancelled by a concurrent change")]
    Cancelled(StationId),
}
