//! Input activity observation.
//!
//! Platform-specific global input hooks that turn key-down, pointer-click
//! and pointer-scroll events into [`ActivityPulse`]s. When no hook can be
//! installed the caller gets a [`CollectorError`] and runs the session in
//! fallback mode.

pub mod types;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub mod noop;

use crossbeam_channel::Receiver;
use thiserror::Error;

// Re-export commonly used types
pub use types::{ActivityPulse, InputKind};

#[cfg(target_os = "macos")]
pub use macos::{check_permission, permission_hint, MacOSCollector};

/// Platform-agnostic collector type alias
#[cfg(target_os = "macos")]
pub type Collector = MacOSCollector;

#[cfg(target_os = "windows")]
pub use self::windows::{check_permission, permission_hint, WindowsCollector};

/// Platform-agnostic collector type alias
#[cfg(target_os = "windows")]
pub type Collector = WindowsCollector;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub use noop::{check_permission, permission_hint, NoopCollector};

/// Platform-agnostic collector type alias
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub type Collector = NoopCollector;

/// Capacity of the pulse channel between a hook thread and the monitor.
pub(crate) const PULSE_CHANNEL_CAPACITY: usize = 10_000;

/// Configuration for which event sources to capture.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub capture_keyboard: bool,
    pub capture_mouse: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            capture_keyboard: true,
            capture_mouse: true,
        }
    }
}

/// Errors that can occur while installing an input hook.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("input hook is already installed")]
    AlreadyRunning,
    #[error("no input source enabled")]
    NoSourcesEnabled,
    #[error("Input Monitoring permission not granted")]
    PermissionDenied,
    #[error("failed to create CGEvent tap")]
    TapCreationFailed,
    #[error("failed to create run loop source")]
    RunLoopSourceFailed,
    #[error("failed to install Windows hook")]
    HookInstallationFailed,
    #[error("global input hooks are not supported on this platform")]
    Unsupported,
}

/// A global input hook capability.
///
/// `install` either yields the pulse stream for the session or reports why
/// observation is unavailable. `uninstall` must release the OS hook before
/// returning and is a no-op when nothing is installed.
pub trait InputHook: Send {
    fn install(&mut self) -> Result<Receiver<ActivityPulse>, CollectorError>;
    fn uninstall(&mut self);
    fn is_installed(&self) -> bool;
}
