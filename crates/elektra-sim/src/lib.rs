//! ---
//! elektra_section: "11-simulation"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Synthetic EV telemetry generation and scenario replay."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
//! Telemetry production for the Elektra workspace: the EV drive-cycle physics
//! generator, recorded-scenario replay, and the sample type both emit.

pub mod generator;
pub mod replay;
pub mod telemetry;

pub use elektra_common::config::OperationMode;
pub use generator::{DrivePhase, EvSignalGenerator};
pub use replay::{ReplayEngine, TelemetrySource};
pub use telemetry::TelemetrySample;
