//! macOS input hook using a listen-only CGEvent tap.
//!
//! The tap runs on its own thread with a CFRunLoop. It requires Input
//! Monitoring permission; without it tap creation fails and the session
//! falls back to foreground-only decisions.

use super::{
    ActivityPulse, CollectorConfig, CollectorError, InputHook, InputKind, PULSE_CHANNEL_CAPACITY,
};
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventTapProxy, CGEventType, CallbackResult,
};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// How long `install` waits for the tap thread to report readiness.
const INSTALL_TIMEOUT: Duration = Duration::from_secs(2);

/// The macOS input hook.
pub struct MacOSCollector {
    config: CollectorConfig,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl MacOSCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }
}

impl InputHook for MacOSCollector {
    fn install(&mut self) -> Result<Receiver<ActivityPulse>, CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        if !self.config.capture_keyboard && !self.config.capture_mouse {
            return Err(CollectorError::NoSourcesEnabled);
        }

        // Bounded so a stalled monitor cannot grow memory without limit
        let (sender, receiver) = bounded(PULSE_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = bounded(1);

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let config = self.config.clone();

        let handle = thread::spawn(move || {
            if let Err(e) = run_event_loop(sender, running.clone(), config, ready_tx.clone()) {
                let _ = ready_tx.try_send(Err(e));
            }
            running.store(false, Ordering::SeqCst);
        });
        self.thread_handle = Some(handle);

        match ready_rx.recv_timeout(INSTALL_TIMEOUT) {
            Ok(Ok(())) => Ok(receiver),
            Ok(Err(e)) => {
                self.uninstall();
                Err(e)
            }
            Err(_) => {
                self.uninstall();
                Err(CollectorError::TapCreationFailed)
            }
        }
    }

    fn uninstall(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            // The run loop wakes every 100ms and sees the flag
            if handle.join().is_err() {
                warn!("event tap thread panicked");
            }
        }
    }

    fn is_installed(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for MacOSCollector {
    fn drop(&mut self) {
        self.uninstall();
    }
}

fn build_event_types(config: &CollectorConfig) -> Vec<CGEventType> {
    let mut types = Vec::new();

    if config.capture_keyboard {
        types.push(CGEventType::KeyDown);
    }

    if config.capture_mouse {
        types.push(CGEventType::LeftMouseDown);
        types.push(CGEventType::RightMouseDown);
        types.push(CGEventType::ScrollWheel);
    }

    types
}

/// Map a tapped event to a pulse kind.
fn classify(event_type: CGEventType) -> Option<InputKind> {
    use core_graphics::event::CGEventType::*;

    match event_type {
        KeyDown => Some(InputKind::KeyDown),
        LeftMouseDown | RightMouseDown => Some(InputKind::Click),
        ScrollWheel => Some(InputKind::Scroll),
        _ => None,
    }
}

fn run_event_loop(
    sender: Sender<ActivityPulse>,
    running: Arc<AtomicBool>,
    config: CollectorConfig,
    ready: Sender<Result<(), CollectorError>>,
) -> Result<(), CollectorError> {
    let event_types = build_event_types(&config);

    let callback = move |_proxy: CGEventTapProxy, event_type: CGEventType, _event: &CGEvent| {
        if let Some(kind) = classify(event_type) {
            // Never block the tap; a full channel just drops the pulse
            let _ = sender.try_send(ActivityPulse::new(kind));
        }
        CallbackResult::Keep
    };

    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        event_types,
        callback,
    )
    .map_err(|_| CollectorError::PermissionDenied)?;

    let source = tap
        .mach_port()
        .create_runloop_source(0)
        .map_err(|_| CollectorError::RunLoopSourceFailed)?;

    let run_loop = CFRunLoop::get_current();
    unsafe {
        run_loop.add_source(&source, kCFRunLoopCommonModes);
    }

    tap.enable();
    let _ = ready.try_send(Ok(()));
    debug!("event tap enabled");

    while running.load(Ordering::SeqCst) {
        CFRunLoop::run_in_mode(
            unsafe { kCFRunLoopCommonModes },
            Duration::from_millis(100),
            false,
        );
    }

    // The tap is disabled when dropped
    Ok(())
}

/// What to tell the user when `check_permission` is false.
pub fn permission_hint() -> &'static str {
    "To count only while you are active, grant Input Monitoring:\n  \
     System Settings > Privacy & Security > Input Monitoring"
}

/// Check if the application has Input Monitoring permission.
///
/// macOS has no direct query for this; creating a throwaway tap fails when
/// permission is missing.
pub fn check_permission() -> bool {
    let result = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![CGEventType::KeyDown],
        |_proxy, _type, _event| CallbackResult::Keep,
    );

    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_types_follow_config() {
        let keyboard_only = CollectorConfig {
            capture_keyboard: true,
            capture_mouse: false,
        };
        assert_eq!(build_event_types(&keyboard_only).len(), 1);
        assert_eq!(build_event_types(&CollectorConfig::default()).len(), 4);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(CGEventType::KeyDown), Some(InputKind::KeyDown));
        assert_eq!(classify(CGEventType::RightMouseDown), Some(InputKind::Click));
        assert_eq!(classify(CGEventType::ScrollWheel), Some(InputKind::Scroll));
        assert_eq!(classify(CGEventType::MouseMoved), None);
    }

    #[test]
    fn test_install_without_sources() {
        let mut collector = MacOSCollector::new(CollectorConfig {
            capture_keyboard: false,
            capture_mouse: false,
        });
        assert!(matches!(
            collector.install(),
            Err(CollectorError::NoSourcesEnabled)
        ));
    }
}
