//! Route builder: owns one route and serializes every change to it.
//!
//! Appends need up to six oracle round-trips, so they run with a per-route
//! async token held for their whole duration. Two appends can therefore
//! never both validate against the same last stop. The route itself sits
//! behind a plain mutex that is only held for short, non-async sections, so
//! `clear` and soft removals go through immediately and can cancel an
//! append that is still waiting on the oracle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, watch};
use tracing::{debug, info};

use crate::domain::{Station, StationId};
use crate::reach::BudgetEstimator;

use super::config::{RemovalPolicy, RouteConfig};
use super::error::RouteError;
use super::model::Route;

/// Mutable route state.
#[derive(Debug, Default)]
struct RouteState {
    stations: Vec<Arc<Station>>,
    /// Candidate of the append currently waiting on the estimator.
    pending: Option<StationId>,
}

impl RouteState {
    fn position(&self, id: &StationId) -> Option<usize> {
        self.stations.iter().position(|s| &s.id == id)
    }

    fn is_selected(&self, id: &StationId) -> bool {
        self.position(id).is_some() || self.pending.as_ref() == Some(id)
    }

    /// Withdraw the pending append if it is for `id`.
    fn cancel_pending(&mut self, id: &StationId) -> bool {
        if self.pending.as_ref() == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    fn snapshot(&self) -> Route {
        Route::new(self.stations.clone())
    }
}

/// Builds a route whose consecutive stops are reachable within a budget.
pub struct RouteBuilder<E> {
    estimator: E,
    config: RouteConfig,
    state: Mutex<RouteState>,
    /// Held by every operation that consults the estimator.
    mutation: AsyncMutex<()>,
    updates: watch::Sender<Route>,
}

impl<E: BudgetEstimator> RouteBuilder<E> {
    /// Create a builder with an empty route.
    pub fn new(estimator: E, config: RouteConfig) -> Self {
        let (updates, _) = watch::channel(Route::default());
        Self {
            estimator,
            config,
            state: Mutex::new(RouteState::default()),
            mutation: AsyncMutex::new(()),
            updates,
        }
    }

    pub fn config(&self) -> &RouteConfig {
        &self.config
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// The current route.
    pub fn route(&self) -> Route {
        self.lock_state().snapshot()
    }

    /// Subscribe to route changes. The receiver sees every committed change.
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.updates.subscribe()
    }

    /// Append `candidate` if it is reachable from the last stop.
    ///
    /// An empty route accepts any station. Otherwise the minimal budget from
    /// the last stop to `candidate` must not exceed the configured limit, or
    /// the append fails with [`RouteError::TooFar`]. If the route is cleared,
    /// its last stop removed, or `candidate` deselected while the estimate is
    /// in flight, the result is discarded with [`RouteError::Cancelled`].
    ///
    /// The route is unchanged whenever an error is returned.
    pub async fn try_append(&self, candidate: Arc<Station>) -> Result<Route, RouteError> {
        let _token = self.mutation.lock().await;

        let last = {
            let mut state = self.lock_state();
            if state.position(&candidate.id).is_some() {
                return Err(RouteError::AlreadySelected(candidate.id.clone()));
            }

            match state.stations.last().cloned() {
                None => {
                    debug!(station = %candidate.id, "starting route");
                    state.stations.push(candidate);
                    return Ok(self.publish(&state));
                }
                Some(last) => {
                    state.pending = Some(candidate.id.clone());
                    last
                }
            }
        };

        let required = self.estimator.minimal_budget(&last, &candidate).await;

        let mut state = self.lock_state();
        let still_pending = state.pending.take().as_ref() == Some(&candidate.id);
        let same_last = state.stations.last().is_some_and(|s| s.id == last.id);
        if !still_pending || !same_last {
            debug!(station = %candidate.id, "append cancelled while estimating");
            return Err(RouteError::Cancelled(candidate.id.clone()));
        }

        let limit = self.config.budget_limit;
        if required > limit {
            debug!(from = %last.id, to = %candidate.id, %required, %limit, "candidate too far");
            return Err(RouteError::TooFar {
                from: last.id.clone(),
                to: candidate.id.clone(),
                required,
                limit,
            });
        }

        debug!(from = %last.id, to = %candidate.id, %required, "appending station");
        state.stations.push(candidate);
        Ok(self.publish(&state))
    }

    /// Remove `station` if present, otherwise append it.
    pub async fn toggle(&self, station: Arc<Station>) -> Result<Route, RouteError> {
        let selected = self.lock_state().is_selected(&station.id);
        if selected {
            self.remove(&station.id).await
        } else {
            self.try_append(station).await
        }
    }

    /// Remove a station, keeping the order of the others.
    ///
    /// Removing an absent id leaves the route as it is. Under
    /// [`RemovalPolicy::Soft`] this never fails. Under
    /// [`RemovalPolicy::Revalidate`] removing a middle stop fails with
    /// [`RouteError::TooFar`] if its neighbours are not reachable from one
    /// another within the limit.
    pub async fn remove(&self, id: &StationId) -> Result<Route, RouteError> {
        match self.config.removal_policy {
            RemovalPolicy::Soft => Ok(self.remove_unchecked(id)),
            RemovalPolicy::Revalidate => self.remove_revalidated(id).await,
        }
    }

    /// Empty the route, cancelling any append in flight.
    pub fn clear(&self) -> Route {
        let mut state = self.lock_state();
        state.pending = None;
        state.stations.clear();
        info!("route cleared");
        self.publish(&state)
    }

    fn remove_unchecked(&self, id: &StationId) -> Route {
        let mut state = self.lock_state();
        if state.cancel_pending(id) {
            debug!(station = %id, "deselected station with append in flight");
        }

        match state.position(id) {
            Some(idx) => {
                state.stations.remove(idx);
                debug!(station = %id, "removed station");
                self.publish(&state)
            }
            None => state.snapshot(),
        }
    }

    async fn remove_revalidated(&self, id: &StationId) -> Result<Route, RouteError> {
        {
            let mut state = self.lock_state();
            if state.cancel_pending(id) {
                return Ok(state.snapshot());
            }
        }

        let _token = self.mutation.lock().await;

        let (prev, next) = {
            let mut state = self.lock_state();
            let Some(idx) = state.position(id) else {
                return Ok(state.snapshot());
            };
            if idx == 0 || idx + 1 == state.stations.len() {
                state.stations.remove(idx);
                return Ok(self.publish(&state));
            }
            (
                state.stations[idx - 1].clone(),
                state.stations[idx + 1].clone(),
            )
        };

        let required = self.estimator.minimal_budget(&prev, &next).await;

        let mut state = self.lock_state();
        let Some(idx) = state.position(id) else {
            return Ok(state.snapshot());
        };
        let neighbours_unchanged = idx > 0
            && idx + 1 < state.stations.len()
            && state.stations[idx - 1].id == prev.id
            && state.stations[idx + 1].id == next.id;
        if !neighbours_unchanged {
            return Err(RouteError::Cancelled(id.clone()));
        }

        let limit = self.config.budget_limit;
        if required > limit {
            return Err(RouteError::TooFar {
                from: prev.id.clone(),
                to: next.id.clone(),
                required,
                limit,
            });
        }

        state.stations.remove(idx);
        Ok(self.publish(&state))
    }

    fn lock_state(&self) -> MutexGuard<'_, RouteState> {
        // Critical sections never panic half-way, so a poisoned state is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &RouteState) -> Route {
        let route = state.snapshot();
        self.updates.send_replace(route.clone());
        route
    }
}
