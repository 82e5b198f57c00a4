//! ---
//! elektra_section: "11-simulation"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Synthetic EV telemetry generation and scenario replay."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

/// One pack-level telemetry tuple produced for a monitor tick.
///
/// Current is signed: negative while discharging, positive while charging or
/// regenerating. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Simulated seconds since the source started; monotonic per source.
    pub time: f64,
    /// Pack terminal voltage in volts.
    pub voltage: f64,
    /// Pack current in amps.
    pub current: f64,
    /// Pack temperature in degrees Celsius.
    pub temperature: f64,
    /// Instantaneous power in kilowatts, derived from voltage and current.
    #[serde(default)]
    pub power_kw: f64,
}

impl TelemetrySample {
    pub fn new(time: f64, voltage: f64, current: f64, temperature: f64) -> Self {
        Self {
            time,
            voltage,
            current,
            temperature,
            power_kw: voltage * current / 1000.0,
        }
    }
}
