//! Windows input hook using low-level keyboard and mouse hooks.
//!
//! Hooks are installed on a dedicated thread that pumps messages. The
//! thread is torn down by posting `WM_QUIT` to it, which also unhooks.

use super::{
    ActivityPulse, CollectorConfig, CollectorError, InputHook, InputKind, PULSE_CHANNEL_CAPACITY,
};
use ::windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use ::windows::Win32::System::Threading::GetCurrentThreadId;
use ::windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, GetMessageW, PostThreadMessageW, SetWindowsHookExW, UnhookWindowsHookEx,
    HHOOK, MSG, WH_KEYBOARD_LL, WH_MOUSE_LL, WM_KEYDOWN, WM_LBUTTONDOWN, WM_MOUSEHWHEEL,
    WM_MOUSEWHEEL, WM_QUIT, WM_RBUTTONDOWN, WM_SYSKEYDOWN,
};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

const INSTALL_TIMEOUT: Duration = Duration::from_secs(2);

/// The Windows input hook.
pub struct WindowsCollector {
    config: CollectorConfig,
    running: Arc<AtomicBool>,
    hook_thread_id: Arc<AtomicU32>,
    thread_handle: Option<JoinHandle<()>>,
}

impl WindowsCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            hook_thread_id: Arc::new(AtomicU32::new(0)),
            thread_handle: None,
        }
    }
}

impl InputHook for WindowsCollector {
    fn install(&mut self) -> Result<Receiver<ActivityPulse>, CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        if !self.config.capture_keyboard && !self.config.capture_mouse {
            return Err(CollectorError::NoSourcesEnabled);
        }

        let (sender, receiver) = bounded(PULSE_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = bounded(1);

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let thread_id = self.hook_thread_id.clone();
        let config = self.config.clone();

        let handle = thread::spawn(move || {
            thread_id.store(unsafe { GetCurrentThreadId() }, Ordering::SeqCst);
            if let Err(e) = run_hook_loop(sender, config, ready_tx.clone()) {
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
                Err(CollectorError::HookInstallationFailed)
            }
        }
    }

    fn uninstall(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let Some(handle) = self.thread_handle.take() else {
            return;
        };

        // GetMessageW blocks, so wake the loop explicitly
        let thread_id = self.hook_thread_id.swap(0, Ordering::SeqCst);
        if thread_id != 0 {
            let posted = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) };
            if let Err(e) = posted {
                warn!(error = %e, "could not post WM_QUIT to hook thread");
            }
        }
        if handle.join().is_err() {
            warn!("hook thread panicked");
        }
    }

    fn is_installed(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for WindowsCollector {
    fn drop(&mut self) {
        self.uninstall();
    }
}

// Hook procedures are plain function pointers, so the sender lives in
// thread-local storage on the hook thread.
thread_local! {
    static PULSE_SENDER: std::cell::RefCell<Option<Sender<ActivityPulse>>> = const { std::cell::RefCell::new(None) };
}

fn emit(kind: InputKind) {
    PULSE_SENDER.with(|sender| {
        if let Some(ref s) = *sender.borrow() {
            let _ = s.try_send(ActivityPulse::new(kind));
        }
    });
}

unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code >= 0 && matches!(w_param.0 as u32, WM_KEYDOWN | WM_SYSKEYDOWN) {
        emit(InputKind::KeyDown);
    }

    CallNextHookEx(HHOOK::default(), n_code, w_param, l_param)
}

unsafe extern "system" fn mouse_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code >= 0 {
        match w_param.0 as u32 {
            WM_LBUTTONDOWN | WM_RBUTTONDOWN => emit(InputKind::Click),
            WM_MOUSEWHEEL | WM_MOUSEHWHEEL => emit(InputKind::Scroll),
            _ => {}
        }
    }

    CallNextHookEx(HHOOK::default(), n_code, w_param, l_param)
}

fn run_hook_loop(
    sender: Sender<ActivityPulse>,
    config: CollectorConfig,
    ready: Sender<Result<(), CollectorError>>,
) -> Result<(), CollectorError> {
    PULSE_SENDER.with(|s| {
        *s.borrow_mut() = Some(sender);
    });

    let mut hooks: Vec<HHOOK> = Vec::new();

    unsafe {
        if config.capture_keyboard {
            match SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) {
                Ok(hook) => hooks.push(hook),
                Err(_) => return Err(CollectorError::HookInstallationFailed),
            }
        }

        if config.capture_mouse {
            match SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), None, 0) {
                Ok(hook) => hooks.push(hook),
                Err(_) => {
                    for hook in hooks {
                        let _ = UnhookWindowsHookEx(hook);
                    }
                    return Err(CollectorError::HookInstallationFailed);
                }
            }
        }

        let _ = ready.try_send(Ok(()));
        debug!(hooks = hooks.len(), "low-level hooks installed");

        // Hooks fire while this thread waits in GetMessageW; WM_QUIT returns 0
        let mut msg = MSG::default();
        while GetMessageW(&mut msg, HWND::default(), 0, 0).0 > 0 {}

        for hook in hooks {
            let _ = UnhookWindowsHookEx(hook);
        }
    }

    PULSE_SENDER.with(|s| {
        *s.borrow_mut() = None;
    });
    Ok(())
}

/// What to tell the user when `check_permission` is false.
pub fn permission_hint() -> &'static str {
    "Low-level input hooks could not be installed.\n\
     Check that no security policy blocks global hooks for this program."
}

/// Check whether a low-level keyboard hook can be installed.
pub fn check_permission() -> bool {
    unsafe {
        match SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) {
            Ok(hook) => {
                let _ = UnhookWindowsHookEx(hook);
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_creation() {
        let collector = WindowsCollector::new(CollectorConfig::default());
        assert!(!collector.is_installed());
    }

    #[test]
    fn test_uninstall_without_install_is_noop() {
        let mut collector = WindowsCollector::new(CollectorConfig::default());
        collector.uninstall();
        collector.uninstall();
        assert!(!collector.is_installed());
    }
}
