//! Single-flight coordination of access token refreshes.
//!
//! The coordinator is a two-state machine, Idle and Refreshing. The first
//! request to observe a 401 while Idle becomes the leader and performs the
//! refresh; requests that hit a 401 while Refreshing queue up and are
//! resolved, in arrival order, with the leader's outcome.
//!
//! The state lock is a plain `std::sync::Mutex`: it is only held for the
//! few instructions that flip the flag or touch the queue, never across an
//! `.await`.

use crate::errors::{ApiError, ApiResult};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::debug;

/// New access token, or the error every queued request fails with.
pub type RefreshOutcome = ApiResult<String>;

#[derive(Debug, Default)]
struct RefreshState {
    refreshing: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// Role handed to a request that needs a fresh token.
pub enum RefreshTicket<'a> {
    /// Perform the refresh, then settle the guard.
    Leader(RefreshGuard<'a>),
    /// A refresh is already in flight; wait for its outcome.
    Waiter(RefreshWaiter),
}

/// Proof of leadership for one Refreshing episode.
///
/// Settling (or dropping) the guard drains the queue and returns the
/// coordinator to Idle, whatever path the leader took.
pub struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

pub struct RefreshWaiter {
    receiver: oneshot::Receiver<RefreshOutcome>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims leadership when Idle, otherwise enqueues the caller.
    pub fn enter(&self) -> RefreshTicket<'_> {
        let mut state = self.lock();

        if state.refreshing {
            let (sender, receiver) = oneshot::channel();
            state.waiters.push_back(sender);
            debug!("Refresh in flight, {} request(s) queued", state.waiters.len());
            RefreshTicket::Waiter(RefreshWaiter { receiver })
        } else {
            state.refreshing = true;
            RefreshTicket::Leader(RefreshGuard {
                coordinator: self,
                settled: false,
            })
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Number of requests waiting on the current refresh.
    pub fn pending(&self) -> usize {
        self.lock().waiters.len()
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, outcome: RefreshOutcome) -> usize {
        let waiters = {
            let mut state = self.lock();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        let count = waiters.len();
        for waiter in waiters {
            // A waiter whose request was cancelled has dropped its receiver.
            let _ = waiter.send(outcome.clone());
        }
        count
    }
}

impl RefreshGuard<'_> {
    /// Hands the new token to every queued request. Returns how many were queued.
    pub fn resolve(mut self, token: &str) -> usize {
        self.settled = true;
        self.coordinator.settle(Ok(token.to_string()))
    }

    /// Fails every queued request with the refresh error.
    pub fn reject(mut self, error: &ApiError) -> usize {
        self.settled = true;
        self.coordinator.settle(Err(error.clone()))
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator
                .settle(Err(ApiError::internal("Token refresh was interrupted")));
        }
    }
}

impl RefreshWaiter {
    pub async fn wait(self) -> RefreshOutcome {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(ApiError::internal("Token refresh was abandoned")))
    }
}
