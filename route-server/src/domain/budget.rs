//! Travel-time budget type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a budget falls outside `[1, 60]` minutes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid reachability budget {minutes}: must be between 1 and 60 minutes")]
pub struct InvalidBudget {
    minutes: u32,
}

/// A cycling travel-time budget in whole minutes.
///
/// The domain is `[1, 60]`, which is also the search space of the
/// distance estimator. Any `ReachabilityBudget` value is inside the domain.
///
/// # Examples
///
/// ```
/// use route_server::domain::ReachabilityBudget;
///
/// let budget = ReachabilityBudget::new(30).unwrap();
/// assert_eq!(budget.minutes(), 30);
///
/// assert!(ReachabilityBudget::new(0).is_err());
/// assert!(ReachabilityBudget::new(61).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ReachabilityBudget(u8);

impl ReachabilityBudget {
    /// Smallest budget in the domain.
    pub const MIN: Self = Self(1);

    /// Largest budget in the domain. Also the estimator's "not confirmed" answer.
    pub const MAX: Self = Self(60);

    /// Budget enforced between consecutive route stops unless configured otherwise.
    pub const DEFAULT_POLICY: Self = Self(30);

    /// Create a budget, rejecting values outside `[1, 60]`.
    pub fn new(minutes: u32) -> Result<Self, InvalidBudget> {
        if (Self::MIN.0 as u32..=Self::MAX.0 as u32).contains(&minutes) {
            Ok(Self(minutes as u8))
        } else {
            Err(InvalidBudget { minutes })
        }
    }

    /// The budget in minutes.
    pub fn minutes(self) -> u32 {
        self.0 as u32
    }
}

impl TryFrom<u32> for ReachabilityBudget {
    type Error = InvalidBudget;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl From<ReachabilityBudget> for u32 {
    fn from(budget: ReachabilityBudget) -> Self {
        budget.minutes()
    }
}

impl fmt::Debug for ReachabilityBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReachabilityBudget({}min)", self.0)
    }
}

impl fmt::Display for ReachabilityBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_bounds() {
        assert!(ReachabilityBudget::new(1).is_ok());
        assert!(ReachabilityBudget::new(60).is_ok());
        assert!(ReachabilityBudget::new(0).is_err());
        assert!(ReachabilityBudget::new(61).is_err());
        assert!(ReachabilityBudget::new(u32::MAX).is_err());
    }

    #[test]
    fn constants() {
        assert_eq!(ReachabilityBudget::MIN.minutes(), 1);
        assert_eq!(ReachabilityBudget::MAX.minutes(), 60);
        assert_eq!(ReachabilityBudget::DEFAULT_POLICY.minutes(), 30);
    }

    #[test]
    fn ordering_follows_minutes() {
        let a = ReachabilityBudget::new(17).unwrap();
        let b = ReachabilityBudget::new(31).unwrap();
        assert!(a < b);
        assert!(b > ReachabilityBudget::DEFAULT_POLICY);
    }

    #[test]
    fn error_display() {
        let err = ReachabilityBudget::new(90).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid reachability budget 90: must be between 1 and 60 minutes"
        );
    }

    #[test]
    fn serde_rejects_out_of_range() {
        let ok: ReachabilityBudget = serde_json::from_str("45").unwrap();
        assert_eq!(ok.minutes(), 45);
        assert!(serde_json::from_str::<ReachabilityBudget>("0").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "45");
    }

    #[test]
    fn display_and_debug() {
        let budget = ReachabilityBudget::new(12).unwrap();
        assert_eq!(budget.to_string(), "12 min");
        assert_eq!(format!("{:?}", budget), "ReachabilityBudget(12min)");
    }
}
