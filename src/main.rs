//! Focus Pulse CLI
//!
//! Counts focused time in allowlisted programs.

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use crossbeam_channel::select;
use focus_pulse::{
    avatar::{AvatarFrame, Bounds, RoamingAvatar},
    collector::{check_permission, permission_hint, Collector, CollectorConfig},
    config::{Config, SourceConfig},
    foreground::NativeForeground,
    ledger::{create_shared_ledger_with_persistence, format_duration, FocusLedger, SharedLedger},
    programs, MonitorHandle, Tick, PRIVACY_DECLARATION, VERSION,
};
use serde::Serialize;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};
use tracing_subscriber::EnvFilter;

/// How often a running agent re-reads the config file.
const CONFIG_RELOAD_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "focus-pulse")]
#[command(version = VERSION)]
#[command(about = "Counts focused time in the programs you choose", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start monitoring in the foreground
    Run {
        /// Show the roaming avatar with this marker
        #[arg(long)]
        avatar: Option<String>,

        /// Print ticks as JSON lines
        #[arg(long)]
        json: bool,

        /// Input sources to observe (keyboard, mouse, or all); overrides config
        #[arg(long)]
        sources: Option<String>,
    },

    /// Edit the program allowlist
    Allow {
        #[command(subcommand)]
        action: AllowAction,
    },

    /// List commonly used programs
    Programs,

    /// Pause monitoring
    Pause,

    /// Resume monitoring
    Resume,

    /// Show permission, configuration and totals
    Status,

    /// Display privacy declaration
    Privacy,

    /// Show configuration
    Config,
}

#[derive(Subcommand)]
enum AllowAction {
    /// Add programs to the allowlist
    Add {
        #[arg(required = true)]
        programs: Vec<String>,
    },
    /// Remove programs from the allowlist
    Remove {
        #[arg(required = true)]
        programs: Vec<String>,
    },
    /// Print the allowlist
    List,
    /// Remove every entry
    Clear,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            avatar,
            json,
            sources,
        } => cmd_run(avatar, json, sources.as_deref()),
        Commands::Allow { action } => cmd_allow(action),
        Commands::Programs => cmd_programs(),
        Commands::Pause => cmd_set_paused(true),
        Commands::Resume => cmd_set_paused(false),
        Commands::Status => cmd_status(),
        Commands::Privacy => {
            println!("{PRIVACY_DECLARATION}");
            Ok(())
        }
        Commands::Config => cmd_config(),
    }
}

fn init_logging() {
    let debug_enabled = env::var("FOCUS_PULSE_DEBUG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// One line of `run --json` output.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputLine<'a> {
    Tick {
        #[serde(flatten)]
        tick: &'a Tick,
        focused_ms: u64,
    },
    Avatar {
        #[serde(flatten)]
        frame: &'a AvatarFrame,
    },
}

fn cmd_run(avatar_marker: Option<String>, json: bool, sources: Option<&str>) -> Result<()> {
    let mut config = Config::load().context("could not load configuration")?;
    if let Err(e) = config.ensure_directories() {
        warn!(error = %e, "could not create data directory");
    }

    let source_config = sources
        .map(SourceConfig::from_csv)
        .unwrap_or_else(|| config.sources.clone());
    if !source_config.any_enabled() {
        bail!("at least one input source must be enabled (keyboard or mouse)");
    }

    if !json {
        println!("Focus Pulse v{VERSION}");
        println!();
    }

    if !check_permission() {
        warn!("input observation unavailable, counting foreground time only");
        if !json {
            eprintln!("{}", permission_hint());
            eprintln!();
        }
    }

    if config.allowlist.is_empty() {
        warn!("allowlist is empty, nothing will be counted");
    }

    let ledger = create_shared_ledger_with_persistence(config.ledger_path());
    let collector = Collector::new(CollectorConfig {
        capture_keyboard: source_config.keyboard,
        capture_mouse: source_config.mouse,
    });
    let monitor = MonitorHandle::spawn(
        config.monitor_settings(),
        Box::new(collector),
        Box::new(NativeForeground::new()),
        ledger.clone(),
    );

    let mut avatar = RoamingAvatar::new(Bounds::new(
        f64::from(config.avatar.screen_width),
        f64::from(config.avatar.screen_height),
    ));
    let marker = avatar_marker.or_else(|| {
        config
            .avatar
            .enabled
            .then(|| config.avatar.marker.clone())
    });
    if let Some(ref marker) = marker {
        avatar.enable(marker);
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("could not set Ctrl+C handler")?;

    if !json {
        println!("Allowlist: {}", config.allowlist.entries().join(", "));
        println!("Press Ctrl+C to stop");
        println!();
    }

    // `pause`/`resume`/`allow` from another process reach us through the
    // config file.
    let mut paused = config.paused;
    if paused {
        info!("monitoring is paused, run `focus-pulse resume` to start");
    } else {
        monitor.start()?;
    }

    let ticks = monitor.ticks().clone();
    let frames = avatar.frames().clone();
    let mut last_config_check = Instant::now();

    while running.load(Ordering::SeqCst) {
        if last_config_check.elapsed() >= CONFIG_RELOAD_INTERVAL {
            match Config::load() {
                Ok(cfg) => {
                    if cfg.allowlist != config.allowlist {
                        monitor.set_allowlist(cfg.allowlist.clone())?;
                    }
                    if cfg.paused != paused {
                        paused = cfg.paused;
                        if paused {
                            info!("pausing monitoring");
                            monitor.stop()?;
                        } else {
                            info!("resuming monitoring");
                            monitor.start()?;
                        }
                    }
                    config = cfg;
                }
                Err(e) => debug!(error = %e, "config reload failed, keeping previous"),
            }
            last_config_check = Instant::now();
        }

        select! {
            recv(ticks) -> msg => match msg {
                Ok(tick) => print_tick(&tick, &ledger, json),
                Err(_) => {
                    warn!("monitor disconnected unexpectedly");
                    break;
                }
            },
            recv(frames) -> msg => {
                if let Ok(frame) = msg {
                    print_frame(&frame, json);
                }
            },
            default(Duration::from_millis(100)) => {}
        }
    }

    if !json {
        println!();
        println!("Stopping...");
    }
    avatar.disable();
    monitor.shutdown();

    if let Err(e) = ledger.save() {
        warn!(error = %e, "could not save ledger");
    }

    if !json {
        println!();
        println!("{}", ledger.summary());
    }
    Ok(())
}

fn print_tick(tick: &Tick, ledger: &SharedLedger, json: bool) {
    let focused = ledger.focused();
    if json {
        let line = OutputLine::Tick {
            tick,
            focused_ms: focused.as_millis() as u64,
        };
        match serde_json::to_string(&line) {
            Ok(s) => println!("{s}"),
            Err(e) => warn!(error = %e, "could not serialize tick"),
        }
        return;
    }

    let marker = if tick.should_count { "●" } else { "○" };
    let program = if tick.program_name.is_empty() {
        "-"
    } else {
        tick.program_name.as_str()
    };
    println!(
        "[{}] {} {:<32} focused {}",
        Local::now().format("%H:%M:%S"),
        marker,
        program,
        format_duration(focused)
    );
}

fn print_frame(frame: &AvatarFrame, json: bool) {
    if json {
        if let Ok(s) = serde_json::to_string(&OutputLine::Avatar { frame }) {
            println!("{s}");
        }
    } else {
        let (x, y) = frame.pixel();
        trace!(x, y, facing = ?frame.facing, "avatar moved");
    }
}

fn cmd_allow(action: AllowAction) -> Result<()> {
    let mut config = Config::load().context("could not load configuration")?;

    match action {
        AllowAction::Add { programs } => {
            for program in &programs {
                if config.allow(program) {
                    println!("Added {program}");
                } else {
                    println!("{program} is already allowed");
                }
            }
        }
        AllowAction::Remove { programs } => {
            for program in &programs {
                if config.disallow(program) {
                    println!("Removed {program}");
                } else {
                    println!("{program} was not in the allowlist");
                }
            }
        }
        AllowAction::List => {
            if config.allowlist.is_empty() {
                println!("The allowlist is empty. Add programs with `focus-pulse allow add`.");
            }
            for entry in config.allowlist.entries() {
                println!("{entry}");
            }
            return Ok(());
        }
        AllowAction::Clear => {
            config.allowlist = Default::default();
            println!("Allowlist cleared.");
        }
    }

    config.save().context("could not save configuration")?;
    Ok(())
}

fn cmd_programs() -> Result<()> {
    let config = Config::load().context("could not load configuration")?;

    println!("Common programs (✓ = allowed):");
    println!();
    for (program, allowed) in programs::suggested_with_status(&config.allowlist) {
        println!("  {} {}", if allowed { "✓" } else { " " }, program);
    }
    Ok(())
}

fn cmd_set_paused(paused: bool) -> Result<()> {
    let mut config = Config::load().context("could not load configuration")?;
    config.paused = paused;
    config.save().context("could not save configuration")?;

    if paused {
        println!("Monitoring paused. Use 'focus-pulse resume' to continue.");
    } else {
        println!("Monitoring resumed.");
    }
    Ok(())
}

fn cmd_status() -> Result<()> {
    let config = Config::load().context("could not load configuration")?;

    println!("Focus Pulse Status");
    println!("==================");
    println!();

    if check_permission() {
        println!("Input Observation: Available ✓");
    } else {
        println!("Input Observation: Unavailable ✗");
        println!("{}", permission_hint());
    }
    println!();

    println!("Configuration:");
    println!("  Allowlist: {} program(s)", config.allowlist.len());
    println!("  Poll interval: {}ms", config.poll_interval.as_millis());
    println!("  Idle timeout: {}ms", config.idle_timeout.as_millis());
    println!("  Paused: {}", config.paused);
    println!();

    let ledger_path = config.ledger_path();
    if !ledger_path.exists() {
        println!("No previous session data found.");
        return Ok(());
    }

    let stats = FocusLedger::with_persistence(ledger_path).stats();
    println!("Cumulative Statistics:");
    println!("  Key presses seen: {}", stats.key_pulses);
    println!("  Clicks seen: {}", stats.click_pulses);
    println!("  Scrolls seen: {}", stats.scroll_pulses);
    println!(
        "  Focused time: {}",
        format_duration(Duration::from_millis(stats.focused_ms))
    );
    for (program, ms) in &stats.per_program_ms {
        println!("    {}: {}", program, format_duration(Duration::from_millis(*ms)));
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = Config::load().context("could not load configuration")?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
