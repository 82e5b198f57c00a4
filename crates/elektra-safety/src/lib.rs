//! ---
//! elektra_section: "09-safety-rules"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Threshold rules mapping estimates to safety alerts."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
//! Threshold-based safety evaluation.
//!
//! [`evaluate`] is a pure function over the latest estimates; every matching
//! rule fires independently and in a fixed order, so downstream consumers
//! can rely on reproducible alert sequences.

use elektra_common::config::SafetyConfig;
use serde::{Deserialize, Serialize};

/// Alert thresholds, decoupled from the config layer so the evaluator can be
/// exercised standalone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SafetyLimits {
    /// SOC strictly below this fires the low-charge alert.
    pub low_soc: f64,
    /// SOH strictly below this fires the degraded-health alert.
    pub degraded_soh: f64,
    /// Temperature strictly above this fires the overheat alert.
    pub overheat_temp: f64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            low_soc: 15.0,
            degraded_soh: 70.0,
            overheat_temp: 50.0,
        }
    }
}

impl From<&SafetyConfig> for SafetyLimits {
    fn from(config: &SafetyConfig) -> Self {
        Self {
            low_soc: config.low_soc,
            degraded_soh: config.degraded_soh,
            overheat_temp: config.overheat_temp,
        }
    }
}

/// One fired safety rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafetyAlert {
    LowCharge,
    DegradedHealth,
    Overheat,
    Nominal,
}

impl SafetyAlert {
    /// Operator-facing message for logs and status surfaces.
    pub fn message(&self) -> &'static str {
        match self {
            SafetyAlert::LowCharge => "Low SOC - recharge soon",
            SafetyAlert::DegradedHealth => "Battery health degrading",
            SafetyAlert::Overheat => "Battery overheating",
            SafetyAlert::Nominal => "Battery operating normally",
        }
    }

    pub fn is_nominal(&self) -> bool {
        matches!(self, SafetyAlert::Nominal)
    }
}

impl std::fmt::Display for SafetyAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Evaluate all rules against the latest estimates. Rules are independent,
/// checked SOC then SOH then temperature; a clean pass yields exactly one
/// [`SafetyAlert::Nominal`].
pub fn evaluate(limits: &SafetyLimits, soc: f64, soh: f64, temperature: f64) -> Vec<SafetyAlert> {
    let mut alerts = Vec::new();
    if soc < limits.low_soc {
        alerts.push(SafetyAlert::LowCharge);
    }
    if soh < limits.degraded_soh {
        alerts.push(SafetyAlert::DegradedHealth);
    }
    if temperature > limits.overheat_temp {
        alerts.push(SafetyAlert::Overheat);
    }
    if alerts.is_empty() {
        alerts.push(SafetyAlert::Nominal);
    }
    alerts
}
