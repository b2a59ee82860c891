//! The focus decision state machine.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Monitoring { Quiet | Live } --stop--> Idle
//!
//! Quiet --pulse--> Live --(idle timeout, no pulse)--> Quiet  [pushes Tick{false, ""}]
//! ```
//!
//! In fallback mode (no input hook) liveness is pinned to `Live` for the
//! whole session.

use super::{Allowlist, LivenessState, Liveness, Tick};
use crate::foreground::ForegroundSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Trailing window after the last pulse during which the user is active.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(5000);

/// How the session learns about user activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// An input hook delivers pulses
    Observed,
    /// No hook; a foreground match alone counts as active
    Fallback,
}

/// The single live monitoring session.
#[derive(Debug, Clone)]
pub struct MonitoringSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub input: InputMode,
    liveness: LivenessState,
}

impl MonitoringSession {
    fn new(input: InputMode) -> Self {
        let liveness = match input {
            InputMode::Observed => LivenessState::quiet(),
            InputMode::Fallback => LivenessState::forced_live(),
        };
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            input,
            liveness,
        }
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.liveness()
    }
}

/// Fuses activity pulses and foreground samples into ticks.
#[derive(Debug, Clone)]
pub struct FocusEngine {
    allowlist: Allowlist,
    idle_timeout: Duration,
    session: Option<MonitoringSession>,
}

impl FocusEngine {
    pub fn new(allowlist: Allowlist, idle_timeout: Duration) -> Self {
        Self {
            allowlist,
            idle_timeout,
            session: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_monitoring(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&MonitoringSession> {
        self.session.as_ref()
    }

    /// Current liveness, `None` while idle.
    pub fn liveness(&self) -> Option<Liveness> {
        self.session.as_ref().map(MonitoringSession::liveness)
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// When the armed debounce deadline fires, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.as_ref().and_then(|s| s.liveness.deadline())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session. Returns false (and changes nothing) if one is live.
    pub fn start(&mut self, input: InputMode) -> bool {
        if self.session.is_some() {
            return false;
        }
        let session = MonitoringSession::new(input);
        info!(session = %session.id, input = ?input, "monitoring session started");
        self.session = Some(session);
        true
    }

    /// End the session and drop its deadline. Returns false if idle.
    pub fn stop(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                info!(session = %session.id, "monitoring session stopped");
                true
            }
            None => false,
        }
    }

    /// Replace the allowlist. Takes effect on the next poll evaluation.
    pub fn set_allowlist(&mut self, allowlist: Allowlist) {
        self.allowlist = allowlist;
    }

    /// Switch a running session to fallback after its hook went away.
    pub fn degrade_input(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.input == InputMode::Observed {
                session.input = InputMode::Fallback;
                session.liveness = LivenessState::forced_live();
            }
        }
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Fire the debounce deadline if it is due at `now`.
    pub fn on_timer(&mut self, now: Instant) -> Vec<Tick> {
        let mut ticks = Vec::new();
        self.settle(now, &mut ticks);
        ticks
    }

    /// A user-activity pulse arrived at `now`.
    pub fn on_activity_pulse(&mut self, now: Instant) -> Vec<Tick> {
        let mut ticks = Vec::new();
        self.settle(now, &mut ticks);

        let window = self.idle_timeout;
        if let Some(session) = self.session.as_mut() {
            if session.input == InputMode::Observed && session.liveness.pulse(now, window) {
                debug!("user activity detected");
            }
        }
        ticks
    }

    /// Evaluate one poll cycle. `None` means the cycle produced no sample.
    pub fn on_poll(&mut self, sample: Option<&ForegroundSample>, now: Instant) -> Vec<Tick> {
        let mut ticks = Vec::new();
        self.settle(now, &mut ticks);

        let Some(session) = self.session.as_ref() else {
            return ticks;
        };

        let tick = match sample {
            Some(sample) if !sample.is_empty() => {
                let matched = self.allowlist.matches(&sample.program_name);
                Tick::new(
                    matched && session.liveness.is_live(),
                    sample.program_name.clone(),
                )
            }
            _ => Tick::stopped(),
        };
        ticks.push(tick);
        ticks
    }

    fn settle(&mut self, now: Instant, ticks: &mut Vec<Tick>) {
        if let Some(session) = self.session.as_mut() {
            if session.liveness.expire(now) {
                debug!(timeout_ms = self.idle_timeout.as_millis() as u64, "user activity stopped");
                ticks.push(Tick::stopped());
            }
        }
    }
}

impl Default for FocusEngine {
    fn default() -> Self {
        Self::new(Allowlist::default(), DEFAULT_IDLE_TIMEOUT)
    }
}
