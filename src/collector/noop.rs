//! Input hook stand-in for targets without a global hook implementation.
//!
//! Installing always fails with [`CollectorError::Unsupported`], which puts
//! the session into fallback mode.

use super::{ActivityPulse, CollectorConfig, CollectorError, InputHook};
use crossbeam_channel::Receiver;

/// A collector that can never observe input.
pub struct NoopCollector {
    _config: CollectorConfig,
}

impl NoopCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { _config: config }
    }
}

impl InputHook for NoopCollector {
    fn install(&mut self) -> Result<Receiver<ActivityPulse>, CollectorError> {
        Err(CollectorError::Unsupported)
    }

    fn uninstall(&mut self) {}

    fn is_installed(&self) -> bool {
        false
    }
}

/// There is no permission gate here; the hook is simply unavailable.
pub fn check_permission() -> bool {
    false
}

/// What to tell the user when `check_permission` is false.
pub fn permission_hint() -> &'static str {
    "Input observation is not supported on this platform.\n\
     Sessions run in fallback mode: any allowlisted foreground time counts."
}
