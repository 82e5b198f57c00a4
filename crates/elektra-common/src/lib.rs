//! ---
//! elektra_section: "01-core-functionality"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Shared configuration primitives for the estimation runtime."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
//! Core shared primitives for the Elektra battery-monitoring workspace.
//! This crate exposes configuration loading, logging bring-up, version
//! metadata, and the tick-timing instrumentation consumed across the
//! workspace.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod time;
pub mod version;

pub use config::{
    AppConfig, ArtifactConfig, BatteryConfig, EstimationConfig, LoadedAppConfig, LoggingConfig,
    OperationMode, SafetyConfig, SimulationConfig,
};
pub use logging::{init_tracing, LogFormat};
pub use metrics::{JitterHistogram, TickTimingReporter};
pub use version::VersionInfo;
