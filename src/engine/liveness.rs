//! Activity liveness with a sliding debounce deadline.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Whether the user counts as physically active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Live,
    Quiet,
}

/// Liveness plus the single armed debounce deadline.
///
/// `deadline` is `Some` only while `Live` was earned by a pulse. A forced
/// `Live` (fallback mode) has no deadline and never decays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessState {
    liveness: Liveness,
    deadline: Option<Instant>,
}

impl LivenessState {
    pub fn quiet() -> Self {
        Self {
            liveness: Liveness::Quiet,
            deadline: None,
        }
    }

    pub fn forced_live() -> Self {
        Self {
            liveness: Liveness::Live,
            deadline: None,
        }
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    pub fn is_live(&self) -> bool {
        self.liveness == Liveness::Live
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Record a pulse at `now`. Replaces any armed deadline.
    ///
    /// Returns true when this pulse ended a quiet period.
    pub fn pulse(&mut self, now: Instant, window: Duration) -> bool {
        let woke = self.liveness == Liveness::Quiet;
        self.liveness = Liveness::Live;
        self.deadline = Some(now + window);
        woke
    }

    /// Fire the deadline if it is due at `now`.
    ///
    /// Returns true exactly once per idle period.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.liveness = Liveness::Quiet;
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
