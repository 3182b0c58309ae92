//! # Operator Console Runtime
//!
//! Opens the console's live data channels and keeps the in-memory views
//! current until interrupted.
//!
//! ## Startup Sequence
//!
//! 1. Parse CLI arguments
//! 2. Load configuration (file, then env, then CLI overrides) and validate
//! 3. Initialize telemetry
//! 4. Wire subscriptions and the gap observer, connect every channel
//! 5. Run until Ctrl+C, then close all channels
//!
//! On Unix, SIGHUP closes every channel and starts a fresh cycle.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use console_runtime::ConsoleRuntime;
use console_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use shared_types::Channel;
use stream_client::StreamConfig;
use tracing::{debug, info, warn};

/// Operator console stream runtime
#[derive(Parser, Debug)]
#[command(name = "console-runtime")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL; each channel connects to `{base_url}/{channel}`
    #[arg(long)]
    base_url: Option<String>,

    /// Channel to connect (repeatable). Defaults to the configured set.
    #[arg(long = "channel")]
    channels: Vec<Channel>,

    /// Reconnect closed channels with exponential backoff
    #[arg(long)]
    reconnect: bool,

    /// Log level (overrides OC_LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,

    /// Seconds between status summaries, 0 to disable
    #[arg(long, default_value = "30")]
    status_interval: u64,
}

fn load_config(args: &Args) -> Result<StreamConfig> {
    let mut config = match &args.config {
        Some(path) => StreamConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => StreamConfig::default(),
    };

    config.apply_env_overrides()?;

    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if !args.channels.is_empty() {
        config.channels = args.channels.clone();
    }
    if args.reconnect {
        config.reconnect.enabled = true;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(unix)]
type Hangup = tokio::signal::unix::Signal;
#[cfg(not(unix))]
type Hangup = ();

#[cfg(unix)]
fn install_hangup() -> Result<Hangup> {
    use tokio::signal::unix::{signal, SignalKind};
    signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")
}

#[cfg(not(unix))]
fn install_hangup() -> Result<Hangup> {
    Ok(())
}

#[cfg(unix)]
async fn hangup(signal: &mut Hangup) {
    if signal.recv().await.is_none() {
        std::future::pending::<()>().await;
    }
}

#[cfg(not(unix))]
async fn hangup(_: &mut Hangup) {
    std::future::pending::<()>().await;
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if let Some(level) = &args.log_level {
        telemetry = telemetry.with_log_level(level);
    }
    let _telemetry = init_telemetry(telemetry)?;

    let config = load_config(&args)?;
    info!(
        base_url = %config.base_url,
        channels = ?config.channels,
        reconnect = config.reconnect.enabled,
        "Starting operator console runtime"
    );

    let mut runtime = ConsoleRuntime::from_config(&config)?;
    runtime.start(&config)?;

    let state = runtime.state();
    let channels = config.channels.clone();
    let reporter = (args.status_interval > 0).then(|| {
        let period = Duration::from_secs(args.status_interval);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                {
                    let s = state.read();
                    info!(
                        all_open = s.all_open(&channels),
                        symbols = s.prices.len(),
                        orders = s.orders.len(),
                        alerts = s.alerts.len(),
                        gaps = s.total_gaps(),
                        "Console status"
                    );
                }
                match encode_metrics() {
                    Ok(metrics) => debug!(%metrics, "Metrics snapshot"),
                    Err(e) => warn!(error = %e, "Failed to encode metrics"),
                }
            }
        })
    });

    let mut hangup_signal = install_hangup()?;
    info!("Console runtime is running. Press Ctrl+C to stop.");
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl+C")?;
                break;
            }
            () = hangup(&mut hangup_signal) => {
                info!("Received SIGHUP, restarting console streams");
                runtime.restart_cycle();
                runtime.start(&config)?;
            }
        }
    }

    if let Some(reporter) = reporter {
        reporter.abort();
    }
    runtime.shutdown();

    Ok(())
}
