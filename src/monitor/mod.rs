//! Monitoring runtime.
//!
//! - `schedule`: poll schedule, in-flight guard and stale-result filtering
//!   around the engine, driven by explicit `now`
//! - `runtime`: the thread that owns the core and talks to the hook, the
//!   foreground worker and the presentation layer over channels

pub mod schedule;
pub mod runtime;

// Re-export commonly used types
pub use schedule::{MonitorCore, Wake, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
pub use runtime::{MonitorError, MonitorHandle, MonitorSettings, MonitorStatus};
