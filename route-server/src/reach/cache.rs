//! Caching layer for budget estimates.
//!
//! Each estimate costs up to six isochrone requests, and users toggle the
//! same stations back and forth. Estimates are cached per ordered station
//! pair; cycling times are not symmetric, so `(a, b)` and `(b, a)` are
//! separate entries.

use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::domain::{ReachabilityBudget, Station, StationId};

use super::estimator::BudgetEstimator;

/// Cache key: (origin, destination).
type PairKey = (StationId, StationId);

/// Configuration for the estimate cache.
#[derive(Debug, Clone)]
pub struct EstimatorCacheConfig {
    /// TTL for cached estimates.
    pub ttl: Duration,

    /// Maximum number of cached pairs.
    pub max_capacity: u64,
}

impl Default for EstimatorCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            max_capacity: 10_000,
        }
    }
}

/// Budget estimator with caching.
///
/// Wraps another estimator and remembers its answers. The cap value is
/// never cached: it is also what a failed oracle produces, and a transient
/// outage must not make a pair look unreachable for the whole TTL.
pub struct CachedEstimator<E> {
    inner: E,
    cache: MokaCache<PairKey, ReachabilityBudget>,
}

impl<E: BudgetEstimator> CachedEstimator<E> {
    /// Create a new cached estimator.
    pub fn new(inner: E, config: &EstimatorCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, cache }
    }

    /// Access the wrapped estimator.
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Invalidate all cached estimates, e.g. after a station refresh.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

impl<E: BudgetEstimator> BudgetEstimator for CachedEstimator<E> {
    async fn minimal_budget(&self, origin: &Station, destination: &Station) -> ReachabilityBudget {
        let key = (origin.id.clone(), destination.id.clone());

        if let Some(cached) = self.cache.get(&key).await {
            debug!(origin = %origin.id, destination = %destination.id, %cached, "estimate cache hit");
            return cached;
        }

        let budget = self.inner.minimal_budget(origin, destination).await;
        if budget < ReachabilityBudget::MAX {
            self.cache.insert(key, budget).await;
        }

        budget
    }
}
