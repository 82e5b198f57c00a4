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
use std::sync::Arc;

use elektra_chemistry::ChemistryLibrary;
use elektra_common::config::EstimationConfig;
use serde::{Deserialize, Serialize};

use crate::artifacts::SohModelArtifact;
use crate::features::{assemble_feature_vector, DynamicFeatures};

/// Per-cycle capacity fade assumed by the decay fallback, in percentage
/// points.
const DECAY_PER_CYCLE: f64 = 0.1;

/// Which estimate produced the published SOH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SohBacking {
    /// Learned regression over the 15-entry feature vector.
    RegressionModel,
    /// Deterministic capacity-fade decay.
    LinearDecay,
}

impl SohBacking {
    pub fn as_str(&self) -> &'static str {
        match self {
            SohBacking::RegressionModel => "regression-model",
            SohBacking::LinearDecay => "linear-decay",
        }
    }
}

impl std::fmt::Display for SohBacking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateful state-of-health estimator.
///
/// Raw per-tick predictions are noisy, so they are never published directly:
/// each one lands in a bounded FIFO buffer, and once enough samples are
/// buffered the buffer mean is folded into the published value through an
/// exponential moving average. Until then the estimator holds its initial
/// value.
#[derive(Debug)]
pub struct SohEstimator {
    model: Option<SohModelArtifact>,
    chemistry: Arc<ChemistryLibrary>,
    buffer: VecDeque<f64>,
    buffer_capacity: usize,
    warmup: usize,
    alpha: f64,
    smoothed: f64,
}

impl SohEstimator {
    pub fn new(
        estimation: &EstimationConfig,
        model: Option<SohModelArtifact>,
        chemistry: Arc<ChemistryLibrary>,
    ) -> Self {
        Self {
            model,
            chemistry,
            buffer: VecDeque::with_capacity(estimation.soh_buffer_capacity),
            buffer_capacity: estimation.soh_buffer_capacity,
            warmup: estimation.soh_warmup,
            alpha: estimation.soh_smoothing_alpha,
            smoothed: estimation.initial_soh,
        }
    }

    pub fn backing(&self) -> SohBacking {
        if self.model.is_some() {
            SohBacking::RegressionModel
        } else {
            SohBacking::LinearDecay
        }
    }

    /// Current published estimate, without advancing the smoother.
    pub fn current(&self) -> f64 {
        self.smoothed
    }

    /// Raw predictions currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Fold one tick's features into the estimate and return the smoothed
    /// SOH in percent.
    pub fn predict(&mut self, features: &DynamicFeatures) -> f64 {
        let raw = match &self.model {
            Some(model) => {
                let vector = assemble_feature_vector(features, &self.chemistry);
                model.predict(&vector)
            }
            None => (100.0 - features.cycle * DECAY_PER_CYCLE).max(0.0),
        };
        self.smooth(raw)
    }

    fn smooth(&mut self, raw: f64) -> f64 {
        if self.buffer.len() == self.buffer_capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(raw);
        if self.buffer.len() >= self.warmup {
            let mean = self.buffer.iter().sum::<f64>() / self.buffer.len() as f64;
            self.smoothed = self.alpha * mean + (1.0 - self.alpha) * self.smoothed;
        }
        self.smoothed = self.smoothed.clamp(0.0, 100.0);
        self.smoothed
    }
}
