//! request-tracking data holder
//!
//! every load takes a ticket; only the most recent ticket may write its
//! result back, so a slow response cannot overwrite a newer one. data from
//! the last successful load stays readable while a reload is in flight.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use crate::gateway::GatewayResult;

/// point-in-time copy of a repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }
}

/// identifies one load request, later tickets compare greater
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// what happened to a finished load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// new data applied
    Applied,
    /// error recorded, previous data kept
    Failed,
    /// a newer request was issued meanwhile, result dropped
    Stale(RequestTicket),
}

#[derive(Debug)]
struct State<T> {
    snapshot: Snapshot<T>,
    latest: u64,
}

#[derive(Debug)]
pub struct Repository<T> {
    state: Mutex<State<T>>,
}

impl<T> Default for Repository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Repository<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                snapshot: Snapshot::default(),
                latest: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// start a request, superseding any request still in flight
    pub fn begin(&self) -> RequestTicket {
        let mut state = self.lock();
        state.latest += 1;
        state.snapshot.is_loading = true;
        RequestTicket(state.latest)
    }

    /// write back the result of `ticket`
    ///
    /// returns false, leaving the state untouched, when a newer request was
    /// issued after `ticket`.
    pub fn complete(&self, ticket: RequestTicket, result: GatewayResult<T>) -> bool {
        let mut state = self.lock();
        if ticket.0 != state.latest {
            tracing::debug!(
                ticket = ticket.0,
                latest = state.latest,
                "discarding stale response"
            );
            return false;
        }

        state.snapshot.is_loading = false;
        match result {
            Ok(data) => {
                state.snapshot.data = Some(data);
                state.snapshot.error = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "load failed");
                state.snapshot.error = Some(err.to_string());
            }
        }
        true
    }

    /// give up on `ticket` without a result
    ///
    /// clears the loading flag only while `ticket` is still the latest
    /// request; returns whether it was.
    pub fn abandon(&self, ticket: RequestTicket) -> bool {
        let mut state = self.lock();
        if ticket.0 != state.latest {
            return false;
        }
        tracing::debug!(ticket = ticket.0, "load abandoned");
        state.snapshot.is_loading = false;
        true
    }

    /// run `request` under a fresh ticket and write back its result
    ///
    /// dropping the returned future before it finishes abandons the ticket.
    pub async fn load<F>(&self, request: F) -> LoadOutcome
    where
        F: Future<Output = GatewayResult<T>>,
    {
        let mut in_flight = InFlight {
            repo: self,
            ticket: self.begin(),
            finished: false,
        };
        let result = request.await;
        in_flight.finished = true;
        let ticket = in_flight.ticket;
        let failed = result.is_err();

        if !self.complete(ticket, result) {
            LoadOutcome::Stale(ticket)
        } else if failed {
            LoadOutcome::Failed
        } else {
            LoadOutcome::Applied
        }
    }

    pub fn is_loading(&self) -> bool {
        self.lock().snapshot.is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().snapshot.error.clone()
    }

    /// borrow the current data without cloning it
    pub fn with_data<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        let state = self.lock();
        f(state.snapshot.data.as_ref())
    }
}

/// abandons its ticket unless finished
struct InFlight<'a, T> {
    repo: &'a Repository<T>,
    ticket: RequestTicket,
    finished: bool,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            self.repo.abandon(self.ticket);
        }
    }
}

impl<T: Clone> Repository<T> {
    pub fn snapshot(&self) -> Snapshot<T> {
        self.lock().snapshot.clone()
    }
}
