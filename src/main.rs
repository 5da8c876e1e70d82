//! drive-alive CLI
//!
//! Replays recorded face-tracker output through the drowsiness monitor.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use drive_alive::{
    alarm::{LogRenderSink, TerminalAlarm},
    config::Config,
    core::{create_shared_registry, FaceMonitor},
    feed::{Pacing, ReplayFeed},
    stats::{create_shared_stats_with_persistence, MonitorStats},
    VERSION,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "drive-alive")]
#[command(version = VERSION)]
#[command(about = "Eye-closure and blink-rate monitor for drowsy driving", long_about = None)]
struct Cli {
    /// Use this configuration file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recording of face events (JSON Lines)
    Replay {
        /// Recording to replay
        input: PathBuf,

        /// Space events out according to their timestamps
        #[arg(long)]
        realtime: bool,

        /// Ring the terminal bell on each alert
        #[arg(long)]
        bell: bool,

        /// Write fired alerts to this file as JSON Lines
        #[arg(long)]
        alerts_out: Option<PathBuf>,
    },

    /// Show cumulative statistics
    Status,

    /// Show configuration
    Config {
        /// Write the default configuration to the config file
        #[arg(long)]
        init: bool,
    },

    /// Clear cumulative statistics
    ResetStats,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Replay {
            input,
            realtime,
            bell,
            alerts_out,
        } => cmd_replay(config, &input, realtime, bell, alerts_out),
        Commands::Status => {
            cmd_status(&config);
            Ok(())
        }
        Commands::Config { init } => cmd_config(&config, cli.config.as_deref(), init),
        Commands::ResetStats => cmd_reset_stats(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }?;
    Ok(config)
}

fn cmd_replay(
    config: Config,
    input: &Path,
    realtime: bool,
    bell: bool,
    alerts_out: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!("drive-alive v{VERSION}");
    println!();

    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let run_id = Uuid::new_v4();
    println!("Run ID: {run_id}");
    println!("Replaying: {}", input.display());
    println!(
        "  Closure limit: {} ms",
        config.closure.max_closed_eyes_interval.as_millis()
    );
    if config.blink_rate.enabled {
        println!(
            "  Rapid blinking: {} blinks within {} ms",
            config.blink_rate.min_blinking_count,
            config.blink_rate.min_blinking_interval.as_millis()
        );
    } else {
        println!("  Rapid blinking: disabled");
    }
    println!();

    let mut alerts_writer = match alerts_out {
        Some(ref path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    let stats = create_shared_stats_with_persistence(config.stats_path());
    let registry = create_shared_registry(&config);
    let actuator = TerminalAlarm::new(config.alarm_tone, bell);
    let mut monitor = FaceMonitor::with_shared(
        config,
        registry.clone(),
        stats.clone(),
        actuator,
        LogRenderSink,
    );

    let pacing = if realtime {
        Pacing::RealTime
    } else {
        Pacing::AsFastAsPossible
    };
    let mut feed = ReplayFeed::new(input, pacing);
    feed.start()?;

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    let receiver = feed.receiver().clone();
    let mut last_event_ms = None;
    let mut events = 0u64;

    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                events += 1;
                last_event_ms = Some(event.timestamp_ms());

                if let Some(alert) = monitor.handle(event) {
                    if let Some(ref mut writer) = alerts_writer {
                        writeln!(writer, "{}", serde_json::to_string(&alert)?)?;
                    }
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    feed.stop();

    if let Some(mut writer) = alerts_writer {
        writer.flush()?;
    }

    println!();
    println!(
        "[{}] Replay finished: {} events, {} face(s) still tracked",
        Utc::now().format("%H:%M:%S"),
        events,
        registry.face_number()
    );
    if let Some(at) = last_event_ms {
        if registry.is_blinking_too_fast(at) {
            println!("Rapid blinking notification still showing at {at} ms");
        }
    }

    if let Err(e) = stats.save() {
        eprintln!("Warning: Could not save statistics: {e}");
    }

    println!();
    println!("{}", stats.summary());
    Ok(())
}

fn cmd_status(config: &Config) {
    println!("drive-alive Status");
    println!("==================");
    println!();

    let stats_path = config.stats_path();
    if stats_path.exists() {
        let stats = MonitorStats::with_persistence(stats_path);
        println!("{}", stats.summary());
    } else {
        println!("No previous run data found.");
    }
}

fn cmd_config(config: &Config, path: Option<&Path>, init: bool) -> anyhow::Result<()> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_path);

    if init {
        let defaults = Config::default();
        match path {
            Some(path) => defaults.save_to(path)?,
            None => defaults.save()?,
        }
        println!("Wrote default configuration to {config_path:?}");
        return Ok(());
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {config_path:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn cmd_reset_stats(config: &Config) -> anyhow::Result<()> {
    let stats_path = config.stats_path();
    let stats = MonitorStats::with_persistence(stats_path.clone());
    stats.reset();
    stats
        .save()
        .with_context(|| format!("writing {}", stats_path.display()))?;
    println!("Statistics cleared.");
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")
}
