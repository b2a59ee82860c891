//! The monitor thread.
//!
//! One thread owns the [`MonitorCore`] and is the only place the engine is
//! touched. Commands, activity pulses and foreground outcomes all arrive
//! over channels and are handled one at a time; timers are the select
//! timeout. Ticks leave on a bounded channel.

use super::schedule::MonitorCore;
use crate::collector::{ActivityPulse, InputHook};
use crate::engine::{Allowlist, FocusEngine, InputMode, Liveness, Tick};
use crate::foreground::{ForegroundQuery, QueryWorker};
use crate::ledger::SharedLedger;
use crossbeam_channel::{bounded, never, select, Receiver, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Capacity of the tick channel to the presentation layer.
const TICK_CHANNEL_CAPACITY: usize = 1024;

/// Select timeout while nothing is scheduled.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// Timing and allowlist for a monitor.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub idle_timeout: Duration,
    pub allowlist: Allowlist,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: super::DEFAULT_POLL_INTERVAL,
            idle_timeout: crate::engine::DEFAULT_IDLE_TIMEOUT,
            allowlist: Allowlist::default(),
        }
    }
}

/// Point-in-time view of the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorStatus {
    pub session_id: Option<Uuid>,
    pub input: Option<InputMode>,
    pub liveness: Option<Liveness>,
    pub allowlist_len: usize,
}

impl MonitorStatus {
    pub fn is_monitoring(&self) -> bool {
        self.session_id.is_some()
    }
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("monitor thread is not running")]
    Disconnected,
}

enum Command {
    Start(Sender<bool>),
    Stop(Sender<bool>),
    SetAllowlist(Allowlist, Sender<()>),
    Status(Sender<MonitorStatus>),
    Shutdown,
}

/// Control surface of a running monitor thread.
pub struct MonitorHandle {
    commands: Sender<Command>,
    ticks: Receiver<Tick>,
    thread_handle: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Spawn the monitor thread. It starts idle; call [`start`](Self::start).
    pub fn spawn(
        settings: MonitorSettings,
        hook: Box<dyn InputHook>,
        query: Box<dyn ForegroundQuery>,
        ledger: SharedLedger,
    ) -> Self {
        let (command_tx, command_rx) = bounded(16);
        let (tick_tx, tick_rx) = bounded(TICK_CHANNEL_CAPACITY);

        let engine = FocusEngine::new(settings.allowlist, settings.idle_timeout);
        let monitor = Monitor {
            core: MonitorCore::new(engine, settings.poll_interval),
            hook,
            pulses: None,
            worker: QueryWorker::spawn(query),
            worker_alive: true,
            commands: command_rx,
            ticks: tick_tx,
            ledger,
        };

        let handle = thread::spawn(move || monitor.run());

        Self {
            commands: command_tx,
            ticks: tick_rx,
            thread_handle: Some(handle),
        }
    }

    /// Tick stream for the presentation layer.
    pub fn ticks(&self) -> &Receiver<Tick> {
        &self.ticks
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> Result<T, MonitorError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.commands
            .send(make(reply_tx))
            .map_err(|_| MonitorError::Disconnected)?;
        reply_rx.recv().map_err(|_| MonitorError::Disconnected)
    }

    /// Start monitoring. Returns false if a session was already running.
    pub fn start(&self) -> Result<bool, MonitorError> {
        self.request(Command::Start)
    }

    /// Stop monitoring. Returns false if nothing was running.
    ///
    /// When this returns the hook is uninstalled and no further tick will
    /// be sent.
    pub fn stop(&self) -> Result<bool, MonitorError> {
        self.request(Command::Stop)
    }

    /// Replace the allowlist; applies from the next poll evaluation.
    pub fn set_allowlist(&self, allowlist: Allowlist) -> Result<(), MonitorError> {
        self.request(|reply| Command::SetAllowlist(allowlist, reply))
    }

    pub fn status(&self) -> Result<MonitorStatus, MonitorError> {
        self.request(Command::Status)
    }

    /// Stop any session and join the monitor thread.
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("monitor thread panicked");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

struct Monitor {
    core: MonitorCore,
    hook: Box<dyn InputHook>,
    pulses: Option<Receiver<ActivityPulse>>,
    worker: QueryWorker,
    worker_alive: bool,
    commands: Receiver<Command>,
    ticks: Sender<Tick>,
    ledger: SharedLedger,
}

impl Monitor {
    fn run(mut self) {
        debug!("monitor thread started");

        loop {
            let timeout = self
                .core
                .next_wake()
                .map(|at| at.saturating_duration_since(Instant::now()))
                .unwrap_or(IDLE_WAIT);

            let commands = self.commands.clone();
            let pulses = self.pulses.clone().unwrap_or_else(never);
            let outcomes = if self.worker_alive {
                self.worker.outcomes().clone()
            } else {
                never()
            };

            select! {
                recv(commands) -> msg => match msg {
                    Ok(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                recv(pulses) -> msg => match msg {
                    Ok(pulse) => {
                        self.ledger.record_pulse(pulse.kind);
                        let ticks = self.core.on_pulse(Instant::now());
                        self.emit(ticks);
                    }
                    Err(_) => {
                        warn!("input hook stopped delivering events, falling back to foreground-only");
                        self.pulses = None;
                        self.core.degrade_input();
                    }
                },
                recv(outcomes) -> msg => match msg {
                    Ok(outcome) => {
                        let ticks = self.core.on_query_result(
                            outcome.generation,
                            outcome.result,
                            Instant::now(),
                        );
                        self.emit(ticks);
                    }
                    Err(_) => {
                        warn!("foreground worker exited, polls will be skipped");
                        self.worker_alive = false;
                    }
                },
                default(timeout) => {}
            }

            let wake = self.core.on_wake(Instant::now());
            self.emit(wake.ticks);
            if let Some(generation) = wake.query {
                if !self.worker.dispatch(generation) {
                    self.core.query_rejected(generation);
                }
            }
        }

        self.stop_session();
        self.worker.shutdown();
        debug!("monitor thread exited");
    }

    /// Returns false when the loop should exit.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Start(reply) => {
                let started = self.start_session();
                let _ = reply.send(started);
            }
            Command::Stop(reply) => {
                let stopped = self.stop_session();
                let _ = reply.send(stopped);
            }
            Command::SetAllowlist(allowlist, reply) => {
                info!(entries = allowlist.len(), "allowlist updated");
                self.core.set_allowlist(allowlist);
                let _ = reply.send(());
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Command::Shutdown => return false,
        }
        true
    }

    fn start_session(&mut self) -> bool {
        if self.core.is_monitoring() {
            return false;
        }

        // Resolve the input capability once per session
        let input = match self.hook.install() {
            Ok(receiver) => {
                self.pulses = Some(receiver);
                InputMode::Observed
            }
            Err(e) => {
                warn!(error = %e, "input observation unavailable, foreground match alone will count");
                self.pulses = None;
                InputMode::Fallback
            }
        };

        self.core.start(input, Instant::now())
    }

    fn stop_session(&mut self) -> bool {
        if !self.core.stop() {
            return false;
        }
        self.hook.uninstall();
        self.pulses = None;
        true
    }

    fn status(&self) -> MonitorStatus {
        let engine = self.core.engine();
        let session = engine.session();
        MonitorStatus {
            session_id: session.map(|s| s.id),
            input: session.map(|s| s.input),
            liveness: engine.liveness(),
            allowlist_len: engine.allowlist().len(),
        }
    }

    fn emit(&self, ticks: Vec<Tick>) {
        for tick in ticks {
            self.ledger.record_tick(&tick, self.core.poll_interval());
            match self.ticks.try_send(tick) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => debug!("tick channel full, dropping tick"),
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
    }
}
