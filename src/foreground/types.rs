//! Foreground application samples and the query capability.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The program owning the focused window at one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForegroundSample {
    /// Owner name as reported by the OS; empty when nothing is focused
    pub program_name: String,
}

impl ForegroundSample {
    pub fn new(program_name: impl Into<String>) -> Self {
        Self {
            program_name: program_name.into(),
        }
    }

    /// A sample that saw no foreground application.
    pub fn none() -> Self {
        Self::new("")
    }

    pub fn is_empty(&self) -> bool {
        self.program_name.is_empty()
    }
}

/// Why a poll produced no sample.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForegroundError {
    /// The capability is missing on this platform or session
    #[error("foreground query unavailable: {0}")]
    Unavailable(String),
    /// A single query failed; the next one may succeed
    #[error("foreground query failed: {0}")]
    QueryFailed(String),
}

/// Ask the OS which application owns the focused window.
///
/// `Ok(None)` means the query worked but nothing is focused. Implementations
/// may block; the monitor runs them on a worker thread.
pub trait ForegroundQuery: Send {
    fn query_owner_name(&mut self) -> Result<Option<String>, ForegroundError>;
}
