//! End-to-end scenarios for the monitor core, driven with virtual time.

use focus_pulse::engine::{FocusEngine, InputMode, Liveness, DEFAULT_IDLE_TIMEOUT};
use focus_pulse::foreground::ForegroundError;
use focus_pulse::monitor::{MonitorCore, DEFAULT_POLL_INTERVAL};
use focus_pulse::{Allowlist, Tick};
use std::time::{Duration, Instant};

type Answer = Result<Option<String>, ForegroundError>;

/// Stands in for the monitor thread: runs every due wake-up in order and
/// answers foreground queries on the spot.
struct Sim {
    core: MonitorCore,
    t0: Instant,
    now: Instant,
    answer: Answer,
    hold_queries: bool,
    held: Vec<u64>,
    ticks: Vec<(u64, Tick)>,
}

impl Sim {
    fn new(allowlist: &[&str]) -> Self {
        let engine = FocusEngine::new(
            Allowlist::new(allowlist.iter().copied()),
            DEFAULT_IDLE_TIMEOUT,
        );
        let t0 = Instant::now();
        Self {
            core: MonitorCore::new(engine, DEFAULT_POLL_INTERVAL),
            t0,
            now: t0,
            answer: Ok(None),
            hold_queries: false,
            held: Vec::new(),
            ticks: Vec::new(),
        }
    }

    fn foreground(&mut self, name: &str) {
        self.answer = Ok(Some(name.to_string()));
    }

    fn elapsed_ms(&self) -> u64 {
        (self.now - self.t0).as_millis() as u64
    }

    fn record(&mut self, ticks: Vec<Tick>) {
        let at = self.elapsed_ms();
        self.ticks.extend(ticks.into_iter().map(|t| (at, t)));
    }

    fn start(&mut self, input: InputMode) {
        assert!(self.core.start(input, self.now));
    }

    fn advance_to(&mut self, ms: u64) {
        let target = self.t0 + Duration::from_millis(ms);
        while let Some(wake_at) = self.core.next_wake() {
            if wake_at > target {
                break;
            }
            self.now = wake_at;
            let wake = self.core.on_wake(wake_at);
            self.record(wake.ticks);
            if let Some(generation) = wake.query {
                if self.hold_queries {
                    self.held.push(generation);
                } else {
                    let ticks = self
                        .core
                        .on_query_result(generation, self.answer.clone(), wake_at);
                    self.record(ticks);
                }
            }
        }
        self.now = target;
    }

    fn pulse_at(&mut self, ms: u64) {
        self.advance_to(ms);
        let ticks = self.core.on_pulse(self.now);
        self.record(ticks);
    }

    fn release_held(&mut self) {
        for generation in std::mem::take(&mut self.held) {
            let ticks = self
                .core
                .on_query_result(generation, self.answer.clone(), self.now);
            self.record(ticks);
        }
    }

    fn counted(&self) -> usize {
        self.ticks.iter().filter(|(_, t)| t.should_count).count()
    }

    fn ticks_at(&self, ms: u64) -> Vec<&Tick> {
        self.ticks
            .iter()
            .filter(|(at, _)| *at == ms)
            .map(|(_, t)| t)
            .collect()
    }
}

#[test]
fn test_ten_seconds_in_allowlisted_program_count_ten_ticks() {
    let mut sim = Sim::new(&["Code.exe"]);
    sim.foreground("Code");
    sim.start(InputMode::Fallback);

    sim.advance_to(10_000);

    let counted = sim.counted();
    assert!((9..=11).contains(&counted), "counted {counted} ticks");
    assert!(sim
        .ticks
        .iter()
        .all(|(_, t)| *t == Tick::new(true, "Code")));
}

#[test]
fn test_sliding_window_keeps_user_live_until_last_pulse_plus_timeout() {
    let mut sim = Sim::new(&["code"]);
    sim.foreground("Code.exe");
    sim.start(InputMode::Observed);

    sim.pulse_at(0);
    sim.pulse_at(3000);
    sim.pulse_at(6000);

    sim.advance_to(10_999);
    assert_eq!(sim.core.engine().liveness(), Some(Liveness::Live));
    assert_eq!(sim.counted(), 10);
    assert!(!sim.ticks.contains(&(5000, Tick::stopped())));

    sim.advance_to(11_000);
    assert_eq!(sim.core.engine().liveness(), Some(Liveness::Quiet));

    // Expiry goes out before the poll that observed it
    assert_eq!(
        sim.ticks_at(11_000),
        vec![&Tick::stopped(), &Tick::new(false, "Code.exe")]
    );

    // Quiet is reported once per idle period
    sim.advance_to(20_000);
    let stops = sim
        .ticks
        .iter()
        .filter(|(_, t)| *t == Tick::stopped())
        .count();
    assert_eq!(stops, 1);
    assert_eq!(sim.counted(), 10);
}

#[test]
fn test_notion_session_with_steady_typing() {
    let mut sim = Sim::new(&["Notion.exe", "Code.exe"]);
    sim.foreground("Notion");
    sim.start(InputMode::Observed);

    for ms in (0..=10_000).step_by(2000) {
        sim.pulse_at(ms);
    }

    sim.advance_to(14_999);
    assert!(sim
        .ticks
        .iter()
        .all(|(_, t)| *t == Tick::new(true, "Notion")));
    assert_eq!(sim.counted(), 14);

    sim.advance_to(15_000);
    assert_eq!(sim.ticks_at(15_000)[0], &Tick::stopped());

    sim.foreground("Spotify");
    sim.pulse_at(15_500);
    sim.advance_to(16_000);
    assert_eq!(sim.ticks_at(16_000), vec![&Tick::new(false, "Spotify")]);
    assert_eq!(sim.counted(), 14);
}

#[test]
fn test_no_input_means_no_counting() {
    let mut sim = Sim::new(&["code"]);
    sim.foreground("Code.exe");
    sim.start(InputMode::Observed);

    sim.advance_to(5000);

    assert_eq!(sim.ticks.len(), 5);
    assert_eq!(sim.counted(), 0);
}

#[test]
fn test_unavailable_foreground_never_counts() {
    let mut sim = Sim::new(&["code"]);
    sim.answer = Err(ForegroundError::Unavailable("no display".into()));
    sim.start(InputMode::Fallback);

    sim.advance_to(3000);

    assert_eq!(sim.ticks.len(), 3);
    assert!(sim.ticks.iter().all(|(_, t)| *t == Tick::stopped()));
    assert!(sim.core.is_monitoring());
}

#[test]
fn test_transient_failure_skips_one_sample() {
    let mut sim = Sim::new(&["code"]);
    sim.foreground("Code.exe");
    sim.start(InputMode::Fallback);

    sim.advance_to(1000);
    sim.answer = Err(ForegroundError::QueryFailed("access denied".into()));
    sim.advance_to(2000);
    sim.foreground("Code.exe");
    sim.advance_to(3000);

    assert_eq!(sim.ticks_at(1000), vec![&Tick::new(true, "Code.exe")]);
    assert_eq!(sim.ticks_at(2000), vec![&Tick::stopped()]);
    assert_eq!(sim.ticks_at(3000), vec![&Tick::new(true, "Code.exe")]);
}

#[test]
fn test_no_focused_app_stops_the_timer() {
    let mut sim = Sim::new(&["code"]);
    sim.start(InputMode::Fallback);

    sim.advance_to(1000);
    sim.answer = Ok(Some(String::new()));
    sim.advance_to(2000);

    assert_eq!(sim.ticks_at(1000), vec![&Tick::stopped()]);
    assert_eq!(sim.ticks_at(2000), vec![&Tick::stopped()]);
}

#[test]
fn test_slow_query_skips_ticks_instead_of_queueing() {
    let mut sim = Sim::new(&["code"]);
    sim.foreground("Code.exe");
    sim.hold_queries = true;
    sim.start(InputMode::Fallback);

    sim.advance_to(3500);
    assert_eq!(sim.held.len(), 1);
    assert!(sim.ticks.is_empty());

    sim.release_held();
    sim.hold_queries = false;
    sim.advance_to(4000);

    assert_eq!(sim.ticks.len(), 2);
    assert_eq!(sim.counted(), 2);
}

#[test]
fn test_allowlist_swap_applies_on_next_poll() {
    let mut sim = Sim::new(&["code"]);
    sim.foreground("Code.exe");
    sim.start(InputMode::Fallback);

    sim.advance_to(2000);
    sim.core.set_allowlist(Allowlist::new(["notion"]));
    sim.advance_to(3000);

    assert_eq!(sim.ticks_at(2000), vec![&Tick::new(true, "Code.exe")]);
    assert_eq!(sim.ticks_at(3000), vec![&Tick::new(false, "Code.exe")]);
}

#[test]
fn test_nothing_after_stop() {
    let mut sim = Sim::new(&["code"]);
    sim.foreground("Code.exe");
    sim.hold_queries = true;
    sim.start(InputMode::Observed);
    sim.pulse_at(500);

    sim.advance_to(1000);
    assert!(sim.core.stop());
    assert!(sim.core.next_wake().is_none());

    // The query dispatched before stop resolves afterwards
    sim.release_held();
    sim.advance_to(30_000);
    assert!(sim.ticks.is_empty());

    // A new session is unaffected by the old one's leftovers
    sim.hold_queries = false;
    sim.start(InputMode::Fallback);
    sim.advance_to(31_000);
    assert_eq!(sim.ticks_at(31_000), vec![&Tick::new(true, "Code.exe")]);
}

#[test]
fn test_blank_allowlist_entry_counts_any_program() {
    let mut sim = Sim::new(&[".exe"]);
    sim.foreground("Spotify");
    sim.start(InputMode::Fallback);

    sim.advance_to(2000);

    assert_eq!(sim.ticks_at(1000), vec![&Tick::new(true, "Spotify")]);
    assert_eq!(sim.counted(), 2);
}
