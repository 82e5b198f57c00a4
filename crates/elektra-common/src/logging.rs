//! ---
//! elektra_section: "01-core-functionality"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Shared configuration primitives for the estimation runtime."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

const LOG_ENV: &str = "ELEKTRA_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

// Non-blocking writers stop flushing once their guard drops, so both guards
// are parked here for the life of the process.
static WRITER_GUARDS: OnceCell<[WorkerGuard; 2]> = OnceCell::new();

/// Console rendering for operator-facing output. The daily file sink is
/// always JSON regardless of this choice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    StructuredJson,
    #[default]
    Pretty,
}

/// Install the global tracing subscriber: a console layer in the configured
/// format plus a rolling daily JSON file under `config.directory`.
///
/// The filter directive comes from `ELEKTRA_LOG` when set, then `RUST_LOG`,
/// and finally defaults to `info`, the level the per-tick estimate summaries
/// log at. Calling this twice is harmless; later calls leave the first
/// subscriber in place, which keeps test binaries from fighting over it.
pub fn init_tracing(service_name: &str, config: &LoggingConfig) -> Result<()> {
    std::fs::create_dir_all(&config.directory)
        .with_context(|| format!("creating log directory {}", config.directory.display()))?;

    let prefix = config.file_prefix.as_deref().unwrap_or(service_name);
    let (file_writer, file_guard) =
        tracing_appender::non_blocking(daily_appender(&config.directory, prefix));
    let (console_writer, console_guard) = tracing_appender::non_blocking(io::stdout());
    let _ = WRITER_GUARDS.set([file_guard, console_guard]);

    let console_layer = match config.format {
        LogFormat::StructuredJson => fmt::layer()
            .with_target(false)
            .with_timer(UtcTime::rfc_3339())
            .json()
            .with_writer(console_writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(console_writer)
            .boxed(),
    };
    let file_layer = fmt::layer()
        .with_target(true)
        .with_timer(UtcTime::rfc_3339())
        .json()
        .with_writer(file_writer)
        .boxed();

    tracing_subscriber::registry()
        .with(env_filter())
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .ok();

    info!(
        service = %service_name,
        directory = %config.directory.display(),
        format = ?config.format,
        "logging initialised"
    );
    Ok(())
}

fn daily_appender(directory: &Path, prefix: &str) -> RollingFileAppender {
    RollingFileAppender::new(Rotation::DAILY, directory, format!("{prefix}.log"))
}

fn env_filter() -> EnvFilter {
    match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            eprintln!("ignoring invalid {LOG_ENV} directive ({err}); using {DEFAULT_DIRECTIVE}");
            EnvFilter::new(DEFAULT_DIRECTIVE)
        }),
        Err(_) => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
        }
    }
}
