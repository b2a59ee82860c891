//! Off-loop execution of foreground queries.
//!
//! The worker owns the query and runs one request at a time. Requests carry
//! a generation number that comes back with the outcome, so the monitor can
//! drop results that belong to a session that has already ended.

use super::{ForegroundError, ForegroundQuery};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use tracing::warn;

/// Result of one query, tagged with the generation that requested it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    pub generation: u64,
    pub result: Result<Option<String>, ForegroundError>,
}

/// Thread that executes foreground queries on request.
pub struct QueryWorker {
    requests: Option<Sender<u64>>,
    outcomes: Receiver<QueryOutcome>,
    thread_handle: Option<JoinHandle<()>>,
}

impl QueryWorker {
    pub fn spawn(mut query: Box<dyn ForegroundQuery>) -> Self {
        // One slot: the monitor never has more than one query outstanding
        let (request_tx, request_rx) = bounded::<u64>(1);
        let (outcome_tx, outcome_rx) = unbounded();

        let handle = thread::spawn(move || {
            for generation in request_rx.iter() {
                let result = query.query_owner_name();
                if outcome_tx.send(QueryOutcome { generation, result }).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: Some(request_tx),
            outcomes: outcome_rx,
            thread_handle: Some(handle),
        }
    }

    /// Ask for a query. Returns false if the worker is busy or gone.
    pub fn dispatch(&self, generation: u64) -> bool {
        let Some(requests) = self.requests.as_ref() else {
            return false;
        };
        match requests.try_send(generation) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => {
                warn!("foreground worker exited");
                false
            }
        }
    }

    pub fn outcomes(&self) -> &Receiver<QueryOutcome> {
        &self.outcomes
    }

    /// Stop accepting requests and wait for the current query to finish.
    pub fn shutdown(&mut self) {
        self.requests.take();
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("foreground worker panicked");
            }
        }
    }
}

impl Drop for QueryWorker {
    fn drop(&mut self) {
        // Disconnect without joining; a slow query must not block drop
        self.requests.take();
    }
}
