//! ---
//! elektra_section: "08-state-estimation"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Online SOC/SOH estimation and model artifact handling."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{InferenceError, Result};
use crate::features::FEATURE_ORDER;

/// Pre-fit min-max scaler bounds shipped inside a SOC artifact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScalerBounds {
    pub voltage_min: f64,
    pub voltage_max: f64,
    pub current_min: f64,
    pub current_max: f64,
    pub temperature_min: f64,
    pub temperature_max: f64,
}

impl Default for ScalerBounds {
    fn default() -> Self {
        Self {
            voltage_min: 3.0,
            voltage_max: 4.2,
            current_min: -5.0,
            current_max: 5.0,
            temperature_min: 20.0,
            temperature_max: 60.0,
        }
    }
}

impl ScalerBounds {
    fn validate(&self, path: &Path) -> Result<()> {
        let spans = [
            ("voltage bounds", self.voltage_max - self.voltage_min),
            ("current bounds", self.current_max - self.current_min),
            ("temperature bounds", self.temperature_max - self.temperature_min),
        ];
        for (field, span) in spans {
            if span <= 0.0 {
                return Err(InferenceError::InvalidField {
                    path: path.to_path_buf(),
                    field,
                    requirement: "a positive min-to-max span",
                });
            }
        }
        Ok(())
    }

    /// Scale one telemetry triple into the model's training range.
    pub fn scale(&self, voltage: f64, current: f64, temperature: f64) -> [f64; 3] {
        [
            (voltage - self.voltage_min) / (self.voltage_max - self.voltage_min),
            (current - self.current_min) / (self.current_max - self.current_min),
            (temperature - self.temperature_min) / (self.temperature_max - self.temperature_min),
        ]
    }
}

/// Linear readout over a scaled telemetry window, exported by the training
/// pipeline as JSON.
///
/// `weights` is flattened row-major over the window: three weights per
/// sample, ordered voltage, current, temperature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocModelArtifact {
    pub window: usize,
    #[serde(default)]
    pub scaler: ScalerBounds,
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl SocModelArtifact {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let artifact: Self =
            serde_json::from_str(&contents).map_err(|source| InferenceError::MalformedArtifact {
                path: path.to_path_buf(),
                source,
            })?;
        artifact.validate(path)?;
        info!(path = %path.display(), window = artifact.window, "SOC model artifact loaded");
        Ok(artifact)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.window == 0 {
            return Err(InferenceError::InvalidField {
                path: path.to_path_buf(),
                field: "window",
                requirement: "at least 1",
            });
        }
        let expected = self.window * 3;
        if self.weights.len() != expected {
            return Err(InferenceError::WeightCountMismatch {
                path: path.to_path_buf(),
                expected,
                actual: self.weights.len(),
            });
        }
        self.scaler.validate(path)
    }

    /// Raw model output over a full window of (voltage, current, temperature)
    /// triples. Output scale detection and chemistry bias are the estimator's
    /// job.
    pub fn predict_window<'a, I>(&self, window: I) -> f64
    where
        I: IntoIterator<Item = &'a (f64, f64, f64)>,
    {
        let mut acc = self.bias;
        for (chunk, &(voltage, current, temperature)) in self.weights.chunks(3).zip(window) {
            let scaled = self.scaler.scale(voltage, current, temperature);
            acc += chunk[0] * scaled[0] + chunk[1] * scaled[1] + chunk[2] * scaled[2];
        }
        acc
    }
}

/// Linear regression over the 15-entry SOH feature vector, exported by the
/// training pipeline as JSON. `feature_names` must equal [`FEATURE_ORDER`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SohModelArtifact {
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl SohModelArtifact {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let artifact: Self =
            serde_json::from_str(&contents).map_err(|source| InferenceError::MalformedArtifact {
                path: path.to_path_buf(),
                source,
            })?;
        artifact.validate(path)?;
        info!(path = %path.display(), "SOH model artifact loaded");
        Ok(artifact)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.feature_names.len() != FEATURE_ORDER.len() {
            return Err(InferenceError::FeatureCountMismatch {
                path: path.to_path_buf(),
                expected: FEATURE_ORDER.len(),
                actual: self.feature_names.len(),
            });
        }
        for (position, (found, expected)) in
            self.feature_names.iter().zip(FEATURE_ORDER.iter()).enumerate()
        {
            if found != expected {
                return Err(InferenceError::FeatureOrderMismatch {
                    path: path.to_path_buf(),
                    position,
                    expected: (*expected).to_owned(),
                    found: found.clone(),
                });
            }
        }
        if self.weights.len() != FEATURE_ORDER.len() {
            return Err(InferenceError::WeightCountMismatch {
                path: path.to_path_buf(),
                expected: FEATURE_ORDER.len(),
                actual: self.weights.len(),
            });
        }
        Ok(())
    }

    pub fn predict(&self, features: &[f64; 15]) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .zip(features.iter())
                .map(|(weight, value)| weight * value)
                .sum::<f64>()
    }
}

/// Load an optional SOC artifact. An unset or absent path degrades to the
/// physics backing with a warning; a present-but-corrupt file is a hard error.
pub fn load_soc_artifact(path: Option<&Path>) -> Result<Option<SocModelArtifact>> {
    match path {
        None => Ok(None),
        Some(path) if !path.exists() => {
            warn!(path = %path.display(), "SOC model artifact missing; using coulomb/OCV backing");
            Ok(None)
        }
        Some(path) => SocModelArtifact::load(path).map(Some),
    }
}

/// Load an optional SOH artifact. An unset or absent path degrades to the
/// linear-decay backing with a warning; a present-but-corrupt file is a hard
/// error.
pub fn load_soh_artifact(path: Option<&Path>) -> Result<Option<SohModelArtifact>> {
    match path {
        None => Ok(None),
        Some(path) if !path.exists() => {
            warn!(path = %path.display(), "SOH model artifact missing; using linear-decay backing");
            Ok(None)
        }
        Some(path) => SohModelArtifact::load(path).map(Some),
    }
}
