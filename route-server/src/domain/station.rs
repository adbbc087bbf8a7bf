//! Canonical bike-share station.

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use super::point::Point;

/// Error returned when parsing an empty or malformed station id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station id: {reason}")]
pub struct InvalidStationId {
    reason: &'static str,
}

/// Stable station identity, scoped by the provider that first reported it.
///
/// Provider A ids are numeric and become `a:<id>`; provider B ids are opaque
/// strings and become `b:<id>`. Scoping keeps the two id spaces from
/// colliding after a merge.
///
/// ```
/// use route_server::domain::StationId;
///
/// assert_eq!(StationId::provider_a(17).as_str(), "a:17");
/// assert_eq!(StationId::provider_b("v1").as_str(), "b:v1");
/// assert!(StationId::parse("a:17").is_ok());
/// assert!(StationId::parse("  ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(String);

impl StationId {
    pub fn provider_a(id: u64) -> Self {
        Self(format!("a:{id}"))
    }

    pub fn provider_b(id: &str) -> Self {
        Self(format!("b:{}", id.trim()))
    }

    /// Parse an id as it appears in selection events.
    pub fn parse(s: &str) -> Result<Self, InvalidStationId> {
        let s = s.trim();
        if s.is_empty() {
            return Err(InvalidStationId {
                reason: "must not be empty",
            });
        }
        if s.chars().any(|c| c.is_control() || c == '/') {
            return Err(InvalidStationId {
                reason: "must not contain control characters or '/'",
            });
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which provider(s) reported a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Source {
    ProviderA,
    ProviderB,
    Both,
}

/// Bikes available at a dock.
///
/// The total is always derived, so it cannot drift from its parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BikeCounts {
    pub ebikes: u32,
    pub regular: u32,
}

impl BikeCounts {
    pub fn new(ebikes: u32, regular: u32) -> Self {
        Self { ebikes, regular }
    }

    pub fn total(&self) -> u32 {
        self.ebikes.saturating_add(self.regular)
    }
}

impl Add for BikeCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            ebikes: self.ebikes.saturating_add(rhs.ebikes),
            regular: self.regular.saturating_add(rhs.regular),
        }
    }
}

/// A bike-share dock as seen after both provider feeds have been merged.
///
/// Stations are built by the merger and then shared read-only (usually
/// behind an `Arc`) until the next catalog refresh replaces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub location: Point,
    pub name: String,
    pub address: String,
    pub status: String,
    pub bikes: BikeCounts,
    pub source: Source,
}

impl Station {
    pub fn total_bikes(&self) -> u32 {
        self.bikes.total()
    }

    pub fn ebikes(&self) -> u32 {
        self.bikes.ebikes
    }

    pub fn regular_bikes(&self) -> u32 {
        self.bikes.regular
    }
}
