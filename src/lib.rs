//! Focus Pulse - counts focused time in the programs you chose.
//!
//! The agent watches which application owns the foreground and whether the
//! user is actually touching keyboard or pointer, and turns both into a
//! steady stream of `Tick { should_count, program_name }` decisions a timer
//! can accumulate.
//!
//! # Privacy Guarantees
//!
//! - **No key content**: input events are reduced to "something happened"
//! - **No coordinates**: pointer position is never read
//! - **Names only**: the foreground query reads the program name, never
//!   window titles or content
//! - **Local**: nothing leaves the machine
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Focus Pulse                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   pulses    ┌──────────────────────────┐    │
//! │  │  Collector  │────────────▶│         Monitor          │    │
//! │  │ (input hook)│             │  ┌────────────────────┐  │    │
//! │  └─────────────┘             │  │ schedule (1000 ms) │  │    │
//! │  ┌─────────────┐   samples   │  │  ┌──────────────┐  │  │    │
//! │  │ Foreground  │────────────▶│  │  │    Engine    │  │  │──▶ Tick
//! │  │   worker    │◀────────────│  │  │ (5 s window) │  │  │    │
//! │  └─────────────┘   queries   │  │  └──────────────┘  │  │    │
//! │                              │  └────────────────────┘  │    │
//! │                              └────────────┬─────────────┘    │
//! │                                           ▼                  │
//! │                                    ┌─────────────┐           │
//! │                                    │   Ledger    │           │
//! │                                    └─────────────┘           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use focus_pulse::{
//!     collector::{Collector, CollectorConfig},
//!     foreground::NativeForeground,
//!     ledger::create_shared_ledger,
//!     Allowlist, MonitorHandle, MonitorSettings,
//! };
//!
//! let settings = MonitorSettings {
//!     allowlist: Allowlist::new(["Code.exe", "notion"]),
//!     ..MonitorSettings::default()
//! };
//! let monitor = MonitorHandle::spawn(
//!     settings,
//!     Box::new(Collector::new(CollectorConfig::default())),
//!     Box::new(NativeForeground::new()),
//!     create_shared_ledger(),
//! );
//!
//! monitor.start().expect("monitor thread is running");
//! for tick in monitor.ticks().iter().take(5) {
//!     println!("{} {}", tick.should_count, tick.program_name);
//! }
//! ```

pub mod avatar;
pub mod collector;
pub mod config;
pub mod engine;
pub mod foreground;
pub mod ledger;
pub mod monitor;
pub mod programs;

// Re-export key types at crate root for convenience
pub use collector::{ActivityPulse, Collector, CollectorConfig, CollectorError, InputHook};
pub use config::{Config, ConfigError};
pub use engine::{Allowlist, FocusEngine, InputMode, Liveness, Tick};
pub use foreground::{ForegroundError, ForegroundQuery, ForegroundSample};
pub use ledger::{FocusLedger, LedgerStats, SharedLedger};
pub use monitor::{MonitorError, MonitorHandle, MonitorSettings, MonitorStatus};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                FOCUS PULSE - PRIVACY DECLARATION                 ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This agent counts time spent focused in programs you choose.    ║
║                                                                  ║
║  ✓ WHAT WE OBSERVE:                                              ║
║    • That a key, click or scroll happened (no detail)            ║
║    • The name of the program in the foreground, once a second    ║
║                                                                  ║
║  ✗ WHAT WE NEVER CAPTURE:                                        ║
║    • Which keys you press (no passwords, messages, etc.)         ║
║    • Where your cursor is (no screen position tracking)          ║
║    • Window titles or any screen content                         ║
║                                                                  ║
║  Everything stays on this machine. Only per-program totals       ║
║  and event counts are written to disk.                           ║
║                                                                  ║
║  You can view the totals anytime with:                           ║
║    focus-pulse status                                            ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privacy_declaration_contents() {
        assert!(PRIVACY_DECLARATION.contains("PRIVACY"));
        assert!(PRIVACY_DECLARATION.contains("NEVER CAPTURE"));
        assert!(PRIVACY_DECLARATION.contains("keys you press"));
        assert!(PRIVACY_DECLARATION.contains("focus-pulse status"));
    }
}
