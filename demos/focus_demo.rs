//! Demonstration of a focus monitoring session.
//!
//! This example shows how to:
//! 1. Check for Input Monitoring permission
//! 2. Spawn a monitor with the platform input hook and foreground query
//! 3. Receive ticks for 30 seconds
//! 4. Print the ledger summary
//!
//! Run with: cargo run --example focus_demo
//!
//! Without Input Monitoring permission the session still runs, but every
//! allowlisted foreground second counts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use focus_pulse::{
    collector::{check_permission, Collector, CollectorConfig},
    config::Config,
    foreground::NativeForeground,
    ledger::{create_shared_ledger, format_duration},
    MonitorHandle, PRIVACY_DECLARATION,
};

fn main() {
    println!("Focus Pulse - Monitoring Demo");
    println!("=============================");
    println!();

    println!("{PRIVACY_DECLARATION}");
    println!();

    print!("Checking Input Monitoring permission... ");
    if check_permission() {
        println!("OK ✓");
    } else {
        println!("not granted, input will not be observed");
    }
    println!();

    let config = Config::load().unwrap_or_default();
    let mut settings = config.monitor_settings();
    if settings.allowlist.is_empty() {
        settings.allowlist = focus_pulse::Allowlist::new(["code", "terminal", "firefox"]);
    }
    println!("Allowlist: {}", settings.allowlist.entries().join(", "));

    let ledger = create_shared_ledger();
    let monitor = MonitorHandle::spawn(
        settings,
        Box::new(Collector::new(CollectorConfig::default())),
        Box::new(NativeForeground::new()),
        ledger.clone(),
    );

    println!("Monitoring for 30 seconds...");
    println!("Switch between programs and try typing!");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    if let Err(e) = monitor.start() {
        eprintln!("Error starting monitor: {e}");
        return;
    }

    if let Ok(status) = monitor.status() {
        println!("Input mode: {:?}", status.input);
        println!();
    }

    let started = Instant::now();
    while running.load(Ordering::SeqCst) && started.elapsed() < Duration::from_secs(30) {
        match monitor.ticks().recv_timeout(Duration::from_millis(100)) {
            Ok(tick) => {
                println!(
                    "[{:>5.1}s] {} {:<24} focused {}",
                    started.elapsed().as_secs_f64(),
                    if tick.should_count { "●" } else { "○" },
                    tick.program_name,
                    format_duration(ledger.focused())
                );
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    let _ = monitor.stop();
    monitor.shutdown();

    println!();
    println!("{}", ledger.summary());
}
