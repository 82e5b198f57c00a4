//! ---
//! elektra_section: "08-state-estimation"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Online SOC/SOH estimation and model artifact handling."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::collections::VecDeque;

use elektra_chemistry::ChemistryLibrary;
use elektra_common::config::{BatteryConfig, EstimationConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifacts::SocModelArtifact;

/// Below this magnitude the pack is considered at rest and the terminal
/// voltage is a usable open-circuit proxy.
const REST_CURRENT_A: f64 = 1.0;

/// Complementary filter gain pulling the coulomb estimate toward the
/// OCV-derived one while at rest.
const OCV_BLEND: f64 = 0.02;

/// Linearized inverse of the cell OCV curve around its 3.2 V floor.
const CELL_OCV_FLOOR_V: f64 = 3.2;

/// Which estimate produced the published SOC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SocBacking {
    /// Learned sequence model over a telemetry window.
    SequenceModel,
    /// Coulomb counting corrected by rest-voltage OCV.
    CoulombOcv,
}

impl SocBacking {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocBacking::SequenceModel => "sequence-model",
            SocBacking::CoulombOcv => "coulomb-ocv",
        }
    }
}

impl std::fmt::Display for SocBacking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateful state-of-charge estimator.
///
/// Coulomb counting carries the estimate between samples; whenever the pack
/// rests, a complementary filter bleeds in the OCV-implied SOC to cancel
/// integration drift. When a sequence-model artifact is configured the model
/// takes over as soon as its input window fills, with the physics path still
/// running underneath as the warm-up estimate.
#[derive(Debug)]
pub struct SocEstimator {
    soc: f64,
    prev_time: Option<f64>,
    capacity_as: f64,
    series_cells: f64,
    model: Option<SocModelArtifact>,
    model_window: VecDeque<(f64, f64, f64)>,
    chemistry_gain: f64,
}

impl SocEstimator {
    pub fn new(
        battery: &BatteryConfig,
        estimation: &EstimationConfig,
        model: Option<SocModelArtifact>,
        chemistry: &ChemistryLibrary,
    ) -> Self {
        let window_len = model.as_ref().map(|m| m.window).unwrap_or(0);
        // Electrode mean dV/dQ shifts the model output slightly; zeroed
        // (degraded) chemistry leaves the gain at exactly 1.
        let chemistry_gain = 1.0 + 0.03 * (chemistry.anode().mean + chemistry.cathode().mean);
        Self {
            soc: estimation.initial_soc,
            prev_time: None,
            capacity_as: battery.pack_capacity_as(),
            series_cells: f64::from(battery.series_cells),
            model,
            model_window: VecDeque::with_capacity(window_len),
            chemistry_gain,
        }
    }

    pub fn backing(&self) -> SocBacking {
        if self.model.is_some() {
            SocBacking::SequenceModel
        } else {
            SocBacking::CoulombOcv
        }
    }

    /// Current published estimate, without advancing the filter.
    pub fn current(&self) -> f64 {
        self.soc
    }

    /// Fold one telemetry sample into the estimate and return the updated
    /// SOC in percent. `time` is seconds on the sample clock; out-of-order
    /// samples re-anchor the clock and hold the estimate.
    pub fn predict(&mut self, voltage: f64, current: f64, temperature: f64, time: f64) -> f64 {
        if self.model.is_some() {
            self.push_model_sample(voltage, current, temperature);
        }

        let prev_time = match self.prev_time {
            None => {
                // First sample seeds the clock; the configured initial SOC is
                // the only honest answer until a second sample gives us a dt.
                self.prev_time = Some(time);
                return self.soc;
            }
            Some(prev) => prev,
        };

        let dt = time - prev_time;
        self.prev_time = Some(time);
        if dt <= 0.0 {
            debug!(dt, "non-increasing sample time; holding SOC");
            return self.soc;
        }

        self.soc += current * dt / self.capacity_as * 100.0;
        if current.abs() < REST_CURRENT_A {
            let ocv_soc = (voltage / self.series_cells - CELL_OCV_FLOOR_V) * 100.0;
            self.soc = (1.0 - OCV_BLEND) * self.soc + OCV_BLEND * ocv_soc;
        }
        self.soc = self.soc.clamp(0.0, 100.0);

        if let Some(model_soc) = self.model_estimate() {
            self.soc = model_soc.clamp(0.0, 100.0);
        }
        self.soc
    }

    fn push_model_sample(&mut self, voltage: f64, current: f64, temperature: f64) {
        let window = match &self.model {
            Some(model) => model.window,
            None => return,
        };
        if self.model_window.len() == window {
            self.model_window.pop_front();
        }
        self.model_window.push_back((voltage, current, temperature));
    }

    fn model_estimate(&self) -> Option<f64> {
        let model = self.model.as_ref()?;
        if self.model_window.len() < model.window {
            return None;
        }
        let mut raw = model.predict_window(self.model_window.iter());
        // Training exports either fraction- or percent-scaled targets.
        if raw <= 1.0 {
            raw *= 100.0;
        }
        Some(raw * self.chemistry_gain)
    }
}
