//! Foreground application observation.
//!
//! Platform queries for the program owning the focused window, plus a
//! worker thread that runs them off the monitor loop.

pub mod types;
pub mod worker;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
pub mod noop;

// Re-export commonly used types
pub use types::{ForegroundError, ForegroundQuery, ForegroundSample};
pub use worker::{QueryOutcome, QueryWorker};

#[cfg(target_os = "macos")]
pub use macos::MacOSForeground as NativeForeground;

#[cfg(target_os = "linux")]
pub use linux::LinuxForeground as NativeForeground;

#[cfg(target_os = "windows")]
pub use self::windows::WindowsForeground as NativeForeground;

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
pub use noop::NoopForeground as NativeForeground;
