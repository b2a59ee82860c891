//! Session ledger of observed activity and counted focus time.
//!
//! Counters are atomics so the monitor thread and the presentation side can
//! share one ledger without coordination. Only counts are kept: which kind
//! of input happened, never which key or where.

use crate::collector::InputKind;
use crate::engine::Tick;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// Running statistics for the agent.
#[derive(Debug)]
pub struct FocusLedger {
    /// Key-down pulses observed
    key_pulses: AtomicU64,
    /// Click pulses observed
    click_pulses: AtomicU64,
    /// Scroll pulses observed
    scroll_pulses: AtomicU64,
    /// Ticks pushed to the presentation layer
    ticks_emitted: AtomicU64,
    /// Ticks with `should_count`
    ticks_counted: AtomicU64,
    /// Focused milliseconds across all programs
    focused_ms: AtomicU64,
    /// Focused milliseconds per program name
    per_program_ms: Mutex<BTreeMap<String, u64>>,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl FocusLedger {
    pub fn new() -> Self {
        Self {
            key_pulses: AtomicU64::new(0),
            click_pulses: AtomicU64::new(0),
            scroll_pulses: AtomicU64::new(0),
            ticks_emitted: AtomicU64::new(0),
            ticks_counted: AtomicU64::new(0),
            focused_ms: AtomicU64::new(0),
            per_program_ms: Mutex::new(BTreeMap::new()),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a ledger that resumes from and saves to `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut ledger = Self::new();
        ledger.persist_path = Some(path);

        if let Err(e) = ledger.load() {
            warn!(error = %e, "could not load previous ledger");
        }

        ledger
    }

    pub fn record_pulse(&self, kind: InputKind) {
        let counter = match kind {
            InputKind::KeyDown => &self.key_pulses,
            InputKind::Click => &self.click_pulses,
            InputKind::Scroll => &self.scroll_pulses,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an emitted tick. A counting tick credits `interval` of focus
    /// time to its program.
    pub fn record_tick(&self, tick: &Tick, interval: Duration) {
        self.ticks_emitted.fetch_add(1, Ordering::Relaxed);
        if !tick.should_count {
            return;
        }

        let ms = interval.as_millis() as u64;
        self.ticks_counted.fetch_add(1, Ordering::Relaxed);
        self.focused_ms.fetch_add(ms, Ordering::Relaxed);

        let mut per_program = self
            .per_program_ms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *per_program.entry(tick.program_name.clone()).or_insert(0) += ms;
    }

    pub fn focused(&self) -> Duration {
        Duration::from_millis(self.focused_ms.load(Ordering::Relaxed))
    }

    pub fn stats(&self) -> LedgerStats {
        let per_program_ms = self
            .per_program_ms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        LedgerStats {
            key_pulses: self.key_pulses.load(Ordering::Relaxed),
            click_pulses: self.click_pulses.load(Ordering::Relaxed),
            scroll_pulses: self.scroll_pulses.load(Ordering::Relaxed),
            ticks_emitted: self.ticks_emitted.load(Ordering::Relaxed),
            ticks_counted: self.ticks_counted.load(Ordering::Relaxed),
            focused_ms: self.focused_ms.load(Ordering::Relaxed),
            per_program_ms,
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    pub fn summary(&self) -> String {
        let stats = self.stats();
        let mut out = format!(
            "Session Statistics:\n\
             - Key presses seen: {}\n\
             - Clicks seen: {}\n\
             - Scrolls seen: {}\n\
             - Ticks emitted: {} ({} counted)\n\
             - Focused time: {}\n\
             - Session duration: {} seconds",
            stats.key_pulses,
            stats.click_pulses,
            stats.scroll_pulses,
            stats.ticks_emitted,
            stats.ticks_counted,
            format_duration(Duration::from_millis(stats.focused_ms)),
            stats.session_duration_secs
        );

        if !stats.per_program_ms.is_empty() {
            out.push_str("\n\nFocused time by program:");
            for (program, ms) in &stats.per_program_ms {
                out.push_str(&format!(
                    "\n- {}: {}",
                    program,
                    format_duration(Duration::from_millis(*ms))
                ));
            }
        }
        out
    }

    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedLedger {
                key_pulses: stats.key_pulses,
                click_pulses: stats.click_pulses,
                scroll_pulses: stats.scroll_pulses,
                ticks_emitted: stats.ticks_emitted,
                ticks_counted: stats.ticks_counted,
                focused_ms: stats.focused_ms,
                per_program_ms: stats.per_program_ms,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedLedger =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.key_pulses
                    .store(persisted.key_pulses, Ordering::Relaxed);
                self.click_pulses
                    .store(persisted.click_pulses, Ordering::Relaxed);
                self.scroll_pulses
                    .store(persisted.scroll_pulses, Ordering::Relaxed);
                self.ticks_emitted
                    .store(persisted.ticks_emitted, Ordering::Relaxed);
                self.ticks_counted
                    .store(persisted.ticks_counted, Ordering::Relaxed);
                self.focused_ms
                    .store(persisted.focused_ms, Ordering::Relaxed);
                *self
                    .per_program_ms
                    .get_mut()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = persisted.per_program_ms;
            }
        }
        Ok(())
    }
}

impl Default for FocusLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// `HH:MM:SS`, the way the timer displays it.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Snapshot of ledger statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerStats {
    pub key_pulses: u64,
    pub click_pulses: u64,
    pub scroll_pulses: u64,
    pub ticks_emitted: u64,
    pub ticks_counted: u64,
    pub focused_ms: u64,
    pub per_program_ms: BTreeMap<String, u64>,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// On-disk ledger format.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedLedger {
    key_pulses: u64,
    click_pulses: u64,
    scroll_pulses: u64,
    ticks_emitted: u64,
    ticks_counted: u64,
    focused_ms: u64,
    #[serde(default)]
    per_program_ms: BTreeMap<String, u64>,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared ledger.
pub type SharedLedger = Arc<FocusLedger>;

pub fn create_shared_ledger() -> SharedLedger {
    Arc::new(FocusLedger::new())
}

pub fn create_shared_ledger_with_persistence(path: PathBuf) -> SharedLedger {
    Arc::new(FocusLedger::with_persistence(path))
}
