//! Route policy configuration.

use std::str::FromStr;

use crate::domain::ReachabilityBudget;

/// Whether removing a station re-checks the adjacency it creates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// The budget is only checked when a pair is formed by appending.
    /// Removing a middle station may leave a pair that exceeds it.
    #[default]
    Soft,

    /// Removing a middle station is rejected if its neighbours would end up
    /// further apart than the budget.
    Revalidate,
}

/// Error returned when parsing an unknown removal policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown removal policy {0:?}: expected \"soft\" or \"revalidate\"")]
pub struct InvalidRemovalPolicy(String);

impl FromStr for RemovalPolicy {
    type Err = InvalidRemovalPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(RemovalPolicy::Soft),
            "revalidate" => Ok(RemovalPolicy::Revalidate),
            _ => Err(InvalidRemovalPolicy(s.to_string())),
        }
    }
}

/// Configuration parameters for a route.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Maximum budget allowed between consecutive stops.
    pub budget_limit: ReachabilityBudget,

    /// How removals treat the adjacency they create.
    pub removal_policy: RemovalPolicy,
}

impl RouteConfig {
    pub fn new(budget_limit: ReachabilityBudget, removal_policy: RemovalPolicy) -> Self {
        Self {
            budget_limit,
            removal_policy,
        }
    }

    /// Set the budget limit.
    pub fn with_budget_limit(mut self, budget_limit: ReachabilityBudget) -> Self {
        self.budget_limit = budget_limit;
        self
    }

    /// Set the removal policy.
    pub fn with_removal_policy(mut self, removal_policy: RemovalPolicy) -> Self {
        self.removal_policy = removal_policy;
        self
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            budget_limit: ReachabilityBudget::DEFAULT_POLICY,
            removal_policy: RemovalPolicy::Soft,
        }
    }
}
