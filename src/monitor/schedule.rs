//! Timer scheduling around the focus engine.
//!
//! `MonitorCore` is the imperative shell: it owns the poll schedule and the
//! in-flight query guard, and forwards everything else to [`FocusEngine`].
//! Like the engine it takes `now` explicitly and performs no I/O; the
//! threaded runtime feeds it real time and executes the query requests it
//! hands out.

use crate::engine::{Allowlist, FocusEngine, InputMode, Tick};
use crate::foreground::{ForegroundError, ForegroundSample};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default foreground poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Shortest poll cadence the core accepts; shorter values are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// What a wake-up produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Wake {
    /// Ticks to push now
    pub ticks: Vec<Tick>,
    /// Generation to stamp on a new foreground query, if one is due
    pub query: Option<u64>,
}

pub struct MonitorCore {
    engine: FocusEngine,
    poll_interval: Duration,
    next_poll: Option<Instant>,
    /// Generation of the query currently running, across sessions
    in_flight: Option<u64>,
    generation: u64,
    unavailable_logged: bool,
}

impl MonitorCore {
    pub fn new(engine: FocusEngine, poll_interval: Duration) -> Self {
        if poll_interval < MIN_POLL_INTERVAL {
            warn!(
                poll_interval_ms = poll_interval.as_millis() as u64,
                "poll interval too short, using the minimum"
            );
        }
        Self {
            engine,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            next_poll: None,
            in_flight: None,
            generation: 0,
            unavailable_logged: false,
        }
    }

    pub fn engine(&self) -> &FocusEngine {
        &self.engine
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn is_monitoring(&self) -> bool {
        self.engine.is_monitoring()
    }

    pub fn query_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a session at `now`; the first poll is one interval later.
    pub fn start(&mut self, input: InputMode, now: Instant) -> bool {
        if !self.engine.start(input) {
            return false;
        }
        self.generation += 1;
        self.next_poll = Some(now + self.poll_interval);
        self.unavailable_logged = false;
        true
    }

    /// Stop the session and cancel the poll schedule.
    ///
    /// A query already running is left to finish; its outcome is discarded.
    pub fn stop(&mut self) -> bool {
        self.next_poll = None;
        self.engine.stop()
    }

    pub fn set_allowlist(&mut self, allowlist: Allowlist) {
        self.engine.set_allowlist(allowlist);
    }

    pub fn degrade_input(&mut self) {
        self.engine.degrade_input();
    }

    /// Earliest instant at which `on_wake` has work to do.
    pub fn next_wake(&self) -> Option<Instant> {
        match (self.next_poll, self.engine.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run whatever timers are due at `now`.
    pub fn on_wake(&mut self, now: Instant) -> Wake {
        let mut wake = Wake {
            ticks: self.engine.on_timer(now),
            query: None,
        };

        let Some(due) = self.next_poll else {
            return wake;
        };
        if now < due {
            return wake;
        }

        // Coalesce ticks missed by a late wake-up instead of replaying them
        let missed = (now - due).as_nanos() / self.poll_interval.as_nanos();
        if missed > 0 {
            debug!(missed = missed as u64, "poll ticks coalesced");
        }
        let steps = u32::try_from(missed + 1).unwrap_or(u32::MAX);
        self.next_poll = Some(due + self.poll_interval * steps);

        if let Some(pending) = self.in_flight {
            debug!(generation = pending, "foreground query still pending, skipping tick");
            return wake;
        }

        self.in_flight = Some(self.generation);
        wake.query = Some(self.generation);
        wake
    }

    /// The dispatched query could not be handed to the worker.
    pub fn query_rejected(&mut self, generation: u64) {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
        }
    }

    pub fn on_pulse(&mut self, now: Instant) -> Vec<Tick> {
        self.engine.on_activity_pulse(now)
    }

    /// Feed back a query outcome. Outcomes from older sessions are dropped.
    pub fn on_query_result(
        &mut self,
        generation: u64,
        result: Result<Option<String>, ForegroundError>,
        now: Instant,
    ) -> Vec<Tick> {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
        }
        if generation != self.generation || !self.engine.is_monitoring() {
            debug!(generation, "discarding stale foreground result");
            return self.engine.on_timer(now);
        }

        let sample = match result {
            Ok(Some(name)) => Some(ForegroundSample::new(name)),
            Ok(None) => Some(ForegroundSample::none()),
            Err(ForegroundError::Unavailable(reason)) => {
                if !self.unavailable_logged {
                    warn!(%reason, "foreground query unavailable, ticks will not count");
                    self.unavailable_logged = true;
                }
                None
            }
            Err(ForegroundError::QueryFailed(reason)) => {
                warn!(%reason, "foreground query failed, skipping sample");
                None
            }
        };

        self.engine.on_poll(sample.as_ref(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DEFAULT_IDLE_TIMEOUT;

    fn core() -> MonitorCore {
        let engine = FocusEngine::new(Allowlist::new(["code"]), DEFAULT_IDLE_TIMEOUT);
        MonitorCore::new(engine, DEFAULT_POLL_INTERVAL)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_poll_one_interval_after_start() {
        let t0 = Instant::now();
        let mut core = core();
        core.start(InputMode::Fallback, t0);

        assert_eq!(core.next_wake(), Some(t0 + ms(1000)));
        assert_eq!(core.on_wake(t0 + ms(999)), Wake::default());
        assert_eq!(core.on_wake(t0 + ms(1000)).query, Some(1));
    }

    #[test]
    fn test_pending_query_skips_tick() {
        let t0 = Instant::now();
        let mut core = core();
        core.start(InputMode::Fallback, t0);

        let generation = core.on_wake(t0 + ms(1000)).query.unwrap();
        assert_eq!(core.on_wake(t0 + ms(2000)).query, None);

        core.on_query_result(generation, Ok(Some("Code".into())), t0 + ms(2500));
        assert_eq!(core.on_wake(t0 + ms(3000)).query, Some(generation));
    }

    #[test]
    fn test_late_wake_coalesces() {
        let t0 = Instant::now();
        let mut core = core();
        core.start(InputMode::Fallback, t0);

        assert!(core.on_wake(t0 + ms(3500)).query.is_some());
        assert_eq!(core.next_wake(), Some(t0 + ms(4000)));
    }

    #[test]
    fn test_very_late_wake_coalesces_in_one_step() {
        let t0 = Instant::now();
        let mut core = core();
        core.start(InputMode::Fallback, t0);

        // Eight hours asleep
        let late = t0 + Duration::from_secs(8 * 3600) + ms(250);
        assert!(core.on_wake(late).query.is_some());
        assert_eq!(
            core.next_wake(),
            Some(t0 + Duration::from_secs(8 * 3600) + ms(1000))
        );
    }

    #[test]
    fn test_zero_poll_interval_is_raised() {
        let engine = FocusEngine::new(Allowlist::new(["code"]), DEFAULT_IDLE_TIMEOUT);
        let mut core = MonitorCore::new(engine, Duration::ZERO);
        assert_eq!(core.poll_interval(), MIN_POLL_INTERVAL);

        let t0 = Instant::now();
        core.start(InputMode::Fallback, t0);
        let wake = core.on_wake(t0 + ms(5));
        assert_eq!(wake.query, Some(1));
        assert_eq!(core.next_wake(), Some(t0 + ms(6)));
    }

    #[test]
    fn test_stop_cancels_schedule_and_drops_result() {
        let t0 = Instant::now();
        let mut core = core();
        core.start(InputMode::Observed, t0);
        core.on_pulse(t0);
        let generation = core.on_wake(t0 + ms(1000)).query.unwrap();

        assert!(core.stop());
        assert!(!core.stop());
        assert_eq!(core.next_wake(), None);

        let ticks = core.on_query_result(generation, Ok(Some("Code".into())), t0 + ms(1100));
        assert!(ticks.is_empty());
        assert!(!core.query_in_flight());
    }

    #[test]
    fn test_restart_discards_previous_generation() {
        let t0 = Instant::now();
        let mut core = core();
        core.start(InputMode::Fallback, t0);
        let old = core.on_wake(t0 + ms(1000)).query.unwrap();
        core.stop();
        core.start(InputMode::Fallback, t0 + ms(1100));

        // Old query still running: the new session's first tick is skipped
        assert_eq!(core.on_wake(t0 + ms(2100)).query, None);
        assert!(core
            .on_query_result(old, Ok(Some("Code".into())), t0 + ms(2200))
            .is_empty());
        assert_eq!(core.on_wake(t0 + ms(3100)).query, Some(old + 1));
    }

    #[test]
    fn test_failures_yield_stopped_tick() {
        let t0 = Instant::now();
        let mut core = core();
        core.start(InputMode::Fallback, t0);

        let g = core.on_wake(t0 + ms(1000)).query.unwrap();
        let ticks = core.on_query_result(
            g,
            Err(ForegroundError::Unavailable("none".into())),
            t0 + ms(1000),
        );
        assert_eq!(ticks, vec![Tick::stopped()]);

        let g = core.on_wake(t0 + ms(2000)).query.unwrap();
        let ticks = core.on_query_result(
            g,
            Err(ForegroundError::QueryFailed("boom".into())),
            t0 + ms(2000),
        );
        assert_eq!(ticks, vec![Tick::stopped()]);
        assert!(core.is_monitoring());
    }

    #[test]
    fn test_next_wake_includes_debounce_deadline() {
        let t0 = Instant::now();
        let mut core = core();
        core.start(InputMode::Observed, t0);
        core.on_pulse(t0 + ms(100));

        core.on_wake(t0 + ms(1000));
        core.on_query_result(1, Ok(Some("Code".into())), t0 + ms(1000));
        assert_eq!(core.next_wake(), Some(t0 + ms(2000)));

        core.stop();
        core.start(InputMode::Observed, t0 + ms(1200));
        core.on_pulse(t0 + ms(1200));
        // next_poll at 2200, deadline at 6200
        assert_eq!(core.next_wake(), Some(t0 + ms(2200)));
    }
}
