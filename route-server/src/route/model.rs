//! Immutable route snapshot.

use std::sync::Arc;

use crate::domain::{Station, StationId};

/// An ordered list of stations, in visiting order, without duplicates.
///
/// This is a snapshot: the builder hands out copies and never mutates one
/// after publishing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    stations: Vec<Arc<Station>>,
}

impl Route {
    pub(super) fn new(stations: Vec<Arc<Station>>) -> Self {
        Self { stations }
    }

    pub fn stations(&self) -> &[Arc<Station>] {
        &self.stations
    }

    pub fn ids(&self) -> Vec<StationId> {
        self.stations.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn last(&self) -> Option<&Arc<Station>> {
        self.stations.last()
    }

    pub fn contains(&self, id: &StationId) -> bool {
        self.stations.iter().any(|s| &s.id == id)
    }

    /// Consecutive pairs, i.e. the legs of the route.
    pub fn pairs(&self) -> impl Iterator<Item = (&Arc<Station>, &Arc<Station>)> {
        self.stations.windows(2).map(|w| (&w[0], &w[1]))
    }
}
