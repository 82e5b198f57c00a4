//! ---
//! elektra_section: "01-core-functionality"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Per-tick monitoring pipeline over rolling telemetry."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
//! Core monitoring pipeline for the Elektra battery monitor.
//!
//! [`BatteryMonitor`] owns the rolling telemetry window, both estimators and
//! the safety rules, and turns each incoming sample into a [`MonitorFrame`].

pub mod history;
pub mod monitor;

pub use history::RollingHistory;
pub use monitor::{BatteryMonitor, EstimationStatus, MonitorFrame};
