//! Focus decision engine.
//!
//! This module contains:
//! - Allowlist normalization and matching
//! - Liveness tracking with a sliding debounce deadline
//! - The `FocusEngine` state machine that turns pulses and foreground
//!   samples into [`Tick`]s
//!
//! The engine never reads a clock. Every transition takes `now`, so the
//! monitor runtime drives it with real time and tests drive it with
//! virtual time.

pub mod allowlist;
pub mod decision;
pub mod liveness;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use allowlist::{allowlist_match, normalize, Allowlist};
pub use decision::{FocusEngine, InputMode, MonitoringSession, DEFAULT_IDLE_TIMEOUT};
pub use liveness::{Liveness, LivenessState};

/// The engine's only output: whether the focus timer should run right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub should_count: bool,
    pub program_name: String,
}

impl Tick {
    pub fn new(should_count: bool, program_name: impl Into<String>) -> Self {
        Self {
            should_count,
            program_name: program_name.into(),
        }
    }

    /// `Tick { false, "" }`, emitted on idle expiry and on missing samples.
    pub fn stopped() -> Self {
        Self::new(false, "")
    }
}
