//! ---
//! elektra_section: "01-core-functionality"
//! elektra_subsection: "binary"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Binary entrypoint for the Elektra daemon."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use elektra_common::config::{AppConfig, OperationMode};
use elektra_common::logging::init_tracing;
use elektra_common::metrics::TickTimingReporter;
use elektra_common::time::jitter_us;
use elektra_common::version::VersionInfo;
use elektra_core::BatteryMonitor;
use elektra_sim::TelemetrySource;
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "Elektra battery monitor daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, help = "Override the simulated operating mode")]
    mode: Option<CliMode>,

    #[arg(long, help = "Override the simulated-time acceleration factor")]
    speed_factor: Option<f64>,

    #[arg(long, help = "Stop after this many ticks (runs until ctrl-c when unset)")]
    ticks: Option<u64>,

    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print extended version information and exit"
    )]
    version: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    Standby,
    Discharge,
    Charge,
}

impl From<CliMode> for OperationMode {
    fn from(value: CliMode) -> Self {
        match value {
            CliMode::Standby => OperationMode::Standby,
            CliMode::Discharge => OperationMode::Discharge,
            CliMode::Charge => OperationMode::Charge,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let version = VersionInfo::current();
    if cli.version {
        println!("{}", version.extended());
        return Ok(());
    }

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/example.prod.toml"));
    candidates.push(PathBuf::from("configs/example.dev.toml"));

    let loaded = AppConfig::load_with_source(&candidates)?;
    let mut config = loaded.config;
    let config_path = loaded.source;

    if let Some(mode) = cli.mode {
        config.simulation.initial_mode = mode.into();
    }
    if let Some(speed_factor) = cli.speed_factor {
        config.simulation.speed_factor = speed_factor;
    }
    config
        .validate()
        .context("command-line overrides produced an invalid configuration")?;

    init_tracing("elektrad", &config.logging)?;
    info!(
        config = %config_path.display(),
        version = %version.cli_string(),
        "elektrad starting"
    );

    run_monitor(config, cli.ticks).await
}

async fn run_monitor(config: AppConfig, tick_limit: Option<u64>) -> Result<()> {
    let mut monitor = BatteryMonitor::from_config(&config)?;
    let mut source = TelemetrySource::from_config(&config)?;

    let status = monitor.estimation_status();
    if status.chemistry_degraded {
        warn!("chemistry curves unavailable; dV/dQ features zeroed");
    }
    info!(
        source = source.kind(),
        mode = config.simulation.initial_mode.as_str(),
        soc_backing = status.soc_backing.as_str(),
        soh_backing = status.soh_backing.as_str(),
        "monitor pipeline ready"
    );

    // The simulated clock advances a fixed step per tick; wall-clock jitter
    // is observed separately and never bleeds into the physics.
    let real_dt = config.simulation.tick_interval.as_secs_f64();
    let speed_factor = config.simulation.speed_factor;
    let reporter = TickTimingReporter::new(config.simulation.tick_interval);
    let mut interval = tokio::time::interval(config.simulation.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut last_fire: Option<std::time::Instant> = None;

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(err) = result {
                    warn!(error = %err, "ctrl-c handler failed");
                }
                info!("ctrl-c received; shutting down");
                break;
            }
            instant = interval.tick() => {
                let fired_at = instant.into_std();
                reporter.record_tick();
                let tick_jitter = last_fire
                    .map(|previous| jitter_us(fired_at.duration_since(previous), config.simulation.tick_interval))
                    .unwrap_or(0);
                last_fire = Some(fired_at);
                let Some(sample) = source.next_sample(real_dt, speed_factor) else {
                    warn!("telemetry source exhausted; stopping");
                    break;
                };
                let frame = monitor.ingest(sample);
                info!(
                    tick = frame.tick,
                    sim_time = sample.time,
                    voltage = sample.voltage,
                    current = sample.current,
                    temperature = sample.temperature,
                    soc = frame.soc_percent,
                    soh = frame.soh_percent,
                    max_temp = frame.window_max_temperature,
                    jitter_us = tick_jitter,
                    nominal = frame.alerts.iter().all(|alert| alert.is_nominal()),
                    "monitor tick"
                );
                if let Some(limit) = tick_limit {
                    if frame.tick >= limit {
                        info!(limit, "tick limit reached; stopping");
                        break;
                    }
                }
            }
        }
    }

    if let Some(summary) = reporter.histogram().summary() {
        let path = config.logging.directory.join("elektrad-jitter.json");
        if let Err(err) = reporter.histogram().write_json(&path) {
            warn!(path = %path.display(), error = %err, "failed to write jitter summary");
        }
        debug!(
            samples = summary.samples,
            mean_us = summary.mean_us,
            std_dev_us = summary.std_dev_us,
            "tick jitter summary"
        );
    }
    Ok(())
}
