//! Thread-safe station catalog with wholesale refresh.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::{Source, Station, StationId};
use crate::feeds::{FeedBatch, FeedClient, FeedError, ProviderARecord, ProviderBRecord};
use crate::merge::{MalformedRecord, MergeOutcome, merge_stations};

use super::snapshot::SnapshotCache;

/// Errors refreshing the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Neither provider feed could be fetched
    #[error("all station feeds failed: {0}")]
    AllFeedsFailed(FeedError),

    /// The catalog was built without a feed client
    #[error("catalog has no feed client to refresh from")]
    NoFeedClient,
}

/// Summary of the last catalog refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub stations: usize,
    pub both: usize,
    pub provider_a_only: usize,
    pub provider_b_only: usize,
    /// Records dropped as malformed.
    pub dropped: usize,
    pub refreshed_at: DateTime<Utc>,
    /// Whether the data came from the disk snapshot rather than the feeds.
    pub from_snapshot: bool,
}

impl RefreshReport {
    fn from_outcome(outcome: &MergeOutcome, from_snapshot: bool) -> Self {
        Self {
            stations: outcome.stations.len(),
            both: outcome.count_by_source(Source::Both),
            provider_a_only: outcome.count_by_source(Source::ProviderA),
            provider_b_only: outcome.count_by_source(Source::ProviderB),
            dropped: outcome.dropped.len(),
            refreshed_at: Utc::now(),
            from_snapshot,
        }
    }
}

#[derive(Default)]
struct CatalogState {
    stations: HashMap<StationId, Arc<Station>>,
    report: Option<RefreshReport>,
}

/// Thread-safe canonical station set.
///
/// Clones share the same underlying data. Stations are immutable; a refresh
/// swaps in a whole new set, so holders of an `Arc<Station>` keep a
/// consistent (if stale) view.
#[derive(Clone)]
pub struct StationCatalog {
    inner: Arc<RwLock<CatalogState>>,
    client: Option<FeedClient>,
    snapshot: Option<SnapshotCache>,
}

impl StationCatalog {
    /// Create a catalog by fetching and merging both feeds.
    ///
    /// If the feeds are unavailable, falls back to the disk snapshot when
    /// one is configured and still fresh.
    pub async fn fetch(
        client: FeedClient,
        snapshot: Option<SnapshotCache>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            inner: Arc::new(RwLock::new(CatalogState::default())),
            client: Some(client),
            snapshot,
        };

        match catalog.refresh().await {
            Ok(_) => Ok(catalog),
            Err(e) => {
                let Some(stations) = catalog.snapshot.as_ref().and_then(|s| s.load()) else {
                    return Err(e);
                };
                warn!(error = %e, "station feeds unavailable, starting from snapshot");
                let outcome = MergeOutcome {
                    stations: stations.into_iter().map(|s| (s.id.clone(), s)).collect(),
                    dropped: Vec::new(),
                };
                catalog.install(outcome, true).await;
                Ok(catalog)
            }
        }
    }

    /// Create a catalog from already-merged stations, without a feed.
    pub fn from_stations(stations: impl IntoIterator<Item = Station>) -> Self {
        let outcome = MergeOutcome {
            stations: stations.into_iter().map(|s| (s.id.clone(), s)).collect(),
            dropped: Vec::new(),
        };
        let report = RefreshReport::from_outcome(&outcome, false);
        let state = CatalogState {
            stations: into_shared(outcome),
            report: Some(report),
        };

        Self {
            inner: Arc::new(RwLock::new(state)),
            client: None,
            snapshot: None,
        }
    }

    /// Look up a station by id.
    pub async fn get(&self, id: &StationId) -> Option<Arc<Station>> {
        let guard = self.inner.read().await;
        guard.stations.get(id).cloned()
    }

    /// All stations, ordered by name then id.
    pub async fn all(&self) -> Vec<Arc<Station>> {
        let guard = self.inner.read().await;
        let mut stations: Vec<_> = guard.stations.values().cloned().collect();
        stations.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        stations
    }

    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.stations.len()
    }

    pub async fn is_empty(&self) -> bool {
        let guard = self.inner.read().await;
        guard.stations.is_empty()
    }

    /// Report of the last successful refresh.
    pub async fn last_report(&self) -> Option<RefreshReport> {
        let guard = self.inner.read().await;
        guard.report.clone()
    }

    /// Refetch both feeds and replace the station set.
    ///
    /// If only one feed fails, the catalog is rebuilt from the other. If
    /// both fail, the existing set is preserved and the error is returned.
    pub async fn refresh(&self) -> Result<RefreshReport, CatalogError> {
        let client = self.client.as_ref().ok_or(CatalogError::NoFeedClient)?;

        let (provider_a, provider_b) = futures::join!(client.fetch_provider_a(), async {
            if client.has_provider_b() {
                Some(client.fetch_provider_b().await)
            } else {
                None
            }
        });

        let (provider_a, provider_b) = combine_feeds(provider_a, provider_b)?;
        let outcome = merge_batches(provider_a, provider_b);

        if let Some(snapshot) = &self.snapshot {
            let stations: Vec<Station> = outcome.stations.values().cloned().collect();
            if let Err(e) = snapshot.save(&stations) {
                warn!(error = %e, path = %snapshot.path().display(), "failed to save station snapshot");
            }
        }

        let report = self.install(outcome, false).await;
        info!(
            stations = report.stations,
            both = report.both,
            dropped = report.dropped,
            "station catalog refreshed"
        );
        Ok(report)
    }

    /// Replace the station set with a merge outcome.
    pub async fn install(&self, outcome: MergeOutcome, from_snapshot: bool) -> RefreshReport {
        let report = RefreshReport::from_outcome(&outcome, from_snapshot);
        let stations = into_shared(outcome);

        let mut guard = self.inner.write().await;
        guard.stations = stations;
        guard.report = Some(report.clone());

        report
    }
}

fn into_shared(outcome: MergeOutcome) -> HashMap<StationId, Arc<Station>> {
    outcome
        .stations
        .into_iter()
        .map(|(id, station)| (id, Arc::new(station)))
        .collect()
}

type Batches = (FeedBatch<ProviderARecord>, FeedBatch<ProviderBRecord>);

/// Decide which feed data to merge when one of the feeds failed.
fn combine_feeds(
    provider_a: Result<FeedBatch<ProviderARecord>, FeedError>,
    provider_b: Option<Result<FeedBatch<ProviderBRecord>, FeedError>>,
) -> Result<Batches, CatalogError> {
    match (provider_a, provider_b) {
        (Ok(a), None) => Ok((a, FeedBatch::empty())),
        (Ok(a), Some(Ok(b))) => Ok((a, b)),
        (Ok(a), Some(Err(e))) => {
            warn!(error = %e, "provider B feed failed, merging provider A only");
            Ok((a, FeedBatch::empty()))
        }
        (Err(e), Some(Ok(b))) => {
            warn!(error = %e, "provider A feed failed, merging provider B only");
            Ok((FeedBatch::empty(), b))
        }
        (Err(e), None) | (Err(e), Some(Err(_))) => Err(CatalogError::AllFeedsFailed(e)),
    }
}

/// Merge two decoded feeds, counting undecodable entries as dropped.
fn merge_batches(
    provider_a: FeedBatch<ProviderARecord>,
    provider_b: FeedBatch<ProviderBRecord>,
) -> MergeOutcome {
    let mut outcome = merge_stations(provider_a.records, provider_b.records);
    outcome.dropped.extend(
        provider_a
            .rejected
            .into_iter()
            .chain(provider_b.rejected)
            .map(MalformedRecord::from),
    );
    outcome
}
