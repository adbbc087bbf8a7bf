//! Minimal reachability budget between two stations.

use std::future::Future;

use tracing::debug;

use crate::domain::{ReachabilityBudget, Station};

use super::oracle::ReachabilityOracle;

/// Find the smallest budget in `[1, 60]` for which `probe` answers `true`.
///
/// `probe` must be monotonic: once it is true for some budget it is true for
/// every larger one. Probes are awaited one at a time, each choosing the next
/// midpoint, so at most six are made. If no probe succeeds the answer is
/// [`ReachabilityBudget::MAX`].
///
/// ```
/// use route_server::reach::search_minimal_budget;
///
/// # tokio_test_block_on(async {
/// let best = search_minimal_budget(|b| std::future::ready(b.minutes() >= 17)).await;
/// assert_eq!(best.minutes(), 17);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub async fn search_minimal_budget<F, Fut>(mut probe: F) -> ReachabilityBudget
where
    F: FnMut(ReachabilityBudget) -> Fut,
    Fut: Future<Output = bool>,
{
    let mut low = ReachabilityBudget::MIN.minutes();
    let mut high = ReachabilityBudget::MAX.minutes();
    let mut best = ReachabilityBudget::MAX;

    while low <= high {
        let mid = (low + high) / 2;
        let Ok(budget) = ReachabilityBudget::new(mid) else {
            break;
        };

        if probe(budget).await {
            best = budget;
            high = mid - 1;
        } else {
            low = mid + 1;
        }
    }

    best
}

/// Something that can price the hop between two stations.
///
/// The route builder depends on this rather than on an oracle directly, so
/// estimates can be cached or faked.
pub trait BudgetEstimator: Send + Sync {
    fn minimal_budget(
        &self,
        origin: &Station,
        destination: &Station,
    ) -> impl Future<Output = ReachabilityBudget> + Send;
}

/// Runs [`search_minimal_budget`] against a reachability oracle.
#[derive(Debug, Clone)]
pub struct DistanceEstimator<O> {
    oracle: O,
}

impl<O: ReachabilityOracle> DistanceEstimator<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }
}

impl<O: ReachabilityOracle> BudgetEstimator for DistanceEstimator<O> {
    async fn minimal_budget(&self, origin: &Station, destination: &Station) -> ReachabilityBudget {
        let oracle = &self.oracle;
        let from = origin.location;
        let to = destination.location;

        let best = search_minimal_budget(move |budget| oracle.is_reachable(from, to, budget)).await;
        debug!(origin = %origin.id, destination = %destination.id, %best, "estimated minimal budget");
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BikeCounts, Point, Source, StationId};
    use std::sync::{Arc, Mutex};

    /// Oracle reachable iff the budget is at least `threshold` minutes.
    struct ThresholdOracle {
        threshold: Option<u32>,
        probes: Arc<Mutex<Vec<u32>>>,
    }

    impl ThresholdOracle {
        fn new(threshold: Option<u32>) -> Self {
            Self {
                threshold,
                probes: Arc::default(),
            }
        }
    }

    impl ReachabilityOracle for ThresholdOracle {
        async fn is_reachable(
            &self,
            _origin: Point,
            _destination: Point,
            budget: ReachabilityBudget,
        ) -> bool {
            self.probes.lock().unwrap().push(budget.minutes());
            self.threshold.is_some_and(|t| budget.minutes() >= t)
        }
    }

    fn station(id: u64) -> Station {
        Station {
            id: StationId::provider_a(id),
            location: Point::new(47.0 + id as f64 * 0.01, 8.0),
            name: format!("S{id}"),
            address: String::new(),
            status: "Active".to_string(),
            bikes: BikeCounts::default(),
            source: Source::ProviderA,
        }
    }

    async fn threshold_search(threshold: Option<u32>) -> (u32, Vec<u32>) {
        let oracle = ThresholdOracle::new(threshold);
        let probes = oracle.probes.clone();
        let estimator = DistanceEstimator::new(oracle);
        let best = estimator.minimal_budget(&station(1), &station(2)).await;
        let probes = probes.lock().unwrap().clone();
        (best.minutes(), probes)
    }

    #[tokio::test]
    async fn finds_known_threshold() {
        let (best, probes) = threshold_search(Some(17)).await;
        assert_eq!(best, 17);
        assert!(probes.len() <= 6);
    }

    #[tokio::test]
    async fn never_reachable_is_cap() {
        let (best, probes) = threshold_search(None).await;
        assert_eq!(best, 60);
        assert!(probes.len() <= 6);
        // Every probe failed, so the search walked up to the cap
        assert_eq!(probes.last(), Some(&60));
    }

    #[tokio::test]
    async fn always_reachable_is_one() {
        let (best, _) = threshold_search(Some(0)).await;
        assert_eq!(best, 1);
    }

    #[tokio::test]
    async fn exact_cap_threshold() {
        let (best, _) = threshold_search(Some(60)).await;
        assert_eq!(best, 60);
    }

    #[tokio::test]
    async fn probe_sequence_is_a_binary_search() {
        let (_, probes) = threshold_search(Some(17)).await;
        assert_eq!(probes, vec![30, 15, 22, 18, 16, 17]);
    }

    #[tokio::test]
    async fn closure_probe() {
        let best = search_minimal_budget(|b| std::future::ready(b.minutes() >= 31)).await;
        assert_eq!(best.minutes(), 31);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;

    fn block_on<F: Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(f)
    }

    proptest! {
        /// The search returns exactly the threshold of a monotonic oracle
        #[test]
        fn returns_threshold(threshold in 1u32..=60) {
            let calls = Cell::new(0);
            let best = block_on(search_minimal_budget(|b| {
                calls.set(calls.get() + 1);
                std::future::ready(b.minutes() >= threshold)
            }));
            prop_assert_eq!(best.minutes(), threshold);
            prop_assert!(calls.get() <= 6);
        }

        /// Thresholds beyond the cap are reported as the cap
        #[test]
        fn beyond_cap_is_cap(threshold in 61u32..1000) {
            let best = block_on(search_minimal_budget(|b| std::future::ready(b.minutes() >= threshold)));
            prop_assert_eq!(best, ReachabilityBudget::MAX);
        }
    }
}
