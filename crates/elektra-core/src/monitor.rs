//! ---
//! elektra_section: "01-core-functionality"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Per-tick monitoring pipeline over rolling telemetry."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use elektra_chemistry::ChemistryLibrary;
use elektra_common::config::{AppConfig, BatteryConfig};
use elektra_inference::{
    load_soc_artifact, load_soh_artifact, DynamicFeatures, SocBacking, SocEstimator,
    SocModelArtifact, SohBacking, SohEstimator, SohModelArtifact,
};
use elektra_safety::{evaluate, SafetyAlert, SafetyLimits};
use elektra_sim::TelemetrySample;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::history::RollingHistory;

/// Which backings produced the published estimates, surfaced so consumers
/// can tell full estimation from degraded physics-only operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationStatus {
    pub soc_backing: SocBacking,
    pub soh_backing: SohBacking,
    pub chemistry_degraded: bool,
}

/// Everything one monitor tick produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorFrame {
    pub captured_at: DateTime<Utc>,
    pub tick: u64,
    pub telemetry: TelemetrySample,
    pub soc_percent: f64,
    pub soh_percent: f64,
    /// Hottest sample still inside the rolling window, which is what the
    /// overheat rule is judged against.
    pub window_max_temperature: f64,
    pub alerts: Vec<SafetyAlert>,
    pub estimation: EstimationStatus,
}

/// The per-tick pipeline: telemetry in, estimates and alerts out.
///
/// Every sample walks the same fixed sequence: append to the rolling window,
/// derive the health features, update SOC, update SOH, evaluate safety.
/// Chemistry features and model artifacts are loaded once at construction
/// and shared for the monitor's lifetime.
#[derive(Debug)]
pub struct BatteryMonitor {
    battery: BatteryConfig,
    cycle_accel: f64,
    limits: SafetyLimits,
    chemistry: Arc<ChemistryLibrary>,
    soc: SocEstimator,
    soh: SohEstimator,
    history: RollingHistory,
    tick: u64,
}

impl BatteryMonitor {
    /// Build the full pipeline from config, loading curve files and optional
    /// model artifacts from their configured paths.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let chemistry = Arc::new(ChemistryLibrary::load(
            &config.artifacts.anode_curve,
            &config.artifacts.cathode_curve,
        ));
        let soc_model = load_soc_artifact(config.artifacts.soc_model.as_deref())
            .context("loading SOC model artifact")?;
        let soh_model = load_soh_artifact(config.artifacts.soh_model.as_deref())
            .context("loading SOH model artifact")?;
        Ok(Self::new(config, chemistry, soc_model, soh_model))
    }

    /// Build the pipeline from already-loaded parts.
    pub fn new(
        config: &AppConfig,
        chemistry: Arc<ChemistryLibrary>,
        soc_model: Option<SocModelArtifact>,
        soh_model: Option<SohModelArtifact>,
    ) -> Self {
        let soc = SocEstimator::new(&config.battery, &config.estimation, soc_model, &chemistry);
        let soh = SohEstimator::new(&config.estimation, soh_model, chemistry.clone());
        Self {
            battery: config.battery.clone(),
            cycle_accel: config.estimation.cycle_accel,
            limits: SafetyLimits::from(&config.safety),
            history: RollingHistory::new(
                config.estimation.history_window,
                config.estimation.rolling_std_window,
            ),
            chemistry,
            soc,
            soh,
            tick: 0,
        }
    }

    /// Fold one telemetry sample through the pipeline.
    pub fn ingest(&mut self, sample: TelemetrySample) -> MonitorFrame {
        self.tick += 1;
        self.history.push(sample);

        let features = DynamicFeatures {
            cycle: self.tick as f64 * self.cycle_accel,
            mean_voltage: self.history.mean_voltage(),
            voltage_std: self.history.voltage_std(),
            min_voltage: self.history.min_voltage(),
            max_voltage: self.history.max_voltage(),
            capacity_ah: self.battery.cell_capacity_ah,
            capacity_ratio: self.battery.capacity_ratio,
            delta_capacity: self.battery.delta_capacity,
            rolling_voltage_std: self.history.rolling_voltage_std(),
        };

        let soc_percent =
            self.soc
                .predict(sample.voltage, sample.current, sample.temperature, sample.time);
        let soh_percent = self.soh.predict(&features);
        let window_max_temperature = self.history.max_temperature();
        let alerts = evaluate(&self.limits, soc_percent, soh_percent, window_max_temperature);
        for alert in alerts.iter().filter(|alert| !alert.is_nominal()) {
            warn!(
                alert = %alert,
                soc = soc_percent,
                soh = soh_percent,
                max_temp = window_max_temperature,
                "safety rule fired"
            );
        }

        debug!(
            tick = self.tick,
            soc = soc_percent,
            soh = soh_percent,
            "monitor tick evaluated"
        );

        MonitorFrame {
            captured_at: Utc::now(),
            tick: self.tick,
            telemetry: sample,
            soc_percent,
            soh_percent,
            window_max_temperature,
            alerts,
            estimation: self.estimation_status(),
        }
    }

    pub fn estimation_status(&self) -> EstimationStatus {
        EstimationStatus {
            soc_backing: self.soc.backing(),
            soh_backing: self.soh.backing(),
            chemistry_degraded: self.chemistry.degraded(),
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn chemistry(&self) -> &ChemistryLibrary {
        &self.chemistry
    }

    pub fn history(&self) -> &RollingHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elektra_inference::FEATURE_ORDER;

    fn sample(time: f64, voltage: f64, current: f64, temperature: f64) -> TelemetrySample {
        TelemetrySample::new(time, voltage, current, temperature)
    }

    #[test]
    fn pipeline_produces_complete_frames_without_artifacts() {
        let config = AppConfig::default();
        let mut monitor = BatteryMonitor::from_config(&config).unwrap();

        let frame = monitor.ingest(sample(0.0, 360.0, -50.0, 30.0));
        assert_eq!(frame.tick, 1);
        assert!((frame.soc_percent - 90.0).abs() < 1e-12);
        assert!((frame.soh_percent - 100.0).abs() < 1e-12);
        assert_eq!(frame.alerts, vec![SafetyAlert::Nominal]);
        assert_eq!(frame.estimation.soc_backing, SocBacking::CoulombOcv);
        assert_eq!(frame.estimation.soh_backing, SohBacking::LinearDecay);
        assert!(frame.estimation.chemistry_degraded);

        // 36 A over 10 s against the default 100 Ah pack is 0.1 points.
        let frame = monitor.ingest(sample(10.0, 360.0, -36.0, 30.0));
        assert_eq!(frame.tick, 2);
        assert!((frame.soc_percent - 89.9).abs() < 1e-9);
    }

    #[test]
    fn soc_seed_below_the_limit_raises_low_charge() {
        let mut config = AppConfig::default();
        config.estimation.initial_soc = 10.0;
        let mut monitor = BatteryMonitor::from_config(&config).unwrap();
        let frame = monitor.ingest(sample(0.0, 310.0, -50.0, 30.0));
        assert_eq!(frame.alerts, vec![SafetyAlert::LowCharge]);
    }

    #[test]
    fn decay_soh_holds_then_blends_after_warmup() {
        let config = AppConfig::default();
        let mut monitor = BatteryMonitor::from_config(&config).unwrap();
        let mut last = 0.0;
        for step in 0..5u32 {
            let frame = monitor.ingest(sample(f64::from(step) * 10.0, 360.0, -36.0, 30.0));
            if step < 4 {
                assert!((frame.soh_percent - 100.0).abs() < 1e-12);
            }
            last = frame.soh_percent;
        }
        // Accelerated cycles decay the raws to a buffer mean of 98.5; the
        // first EMA blend from 100 lands at 99.85.
        assert!((last - 99.85).abs() < 1e-9);
    }

    #[test]
    fn overheat_judges_the_window_maximum() {
        let config = AppConfig::default();
        let mut monitor = BatteryMonitor::from_config(&config).unwrap();
        monitor.ingest(sample(0.0, 360.0, -36.0, 55.0));
        // The next sample is cool, but the hot one is still in the window.
        let frame = monitor.ingest(sample(10.0, 360.0, -36.0, 25.0));
        assert!(frame.alerts.contains(&SafetyAlert::Overheat));
        assert!((frame.window_max_temperature - 55.0).abs() < 1e-12);
    }

    #[test]
    fn model_artifacts_switch_the_backings() {
        let dir = tempfile::tempdir().unwrap();
        let soc_path = dir.path().join("soc.json");
        let soh_path = dir.path().join("soh.json");
        std::fs::write(
            &soc_path,
            r#"{"window":1,"weights":[0.0,0.0,0.0],"bias":0.6}"#,
        )
        .unwrap();
        let names = FEATURE_ORDER
            .iter()
            .map(|name| format!("{name:?}"))
            .collect::<Vec<_>>()
            .join(",");
        let weights = vec!["0.0"; FEATURE_ORDER.len()].join(",");
        std::fs::write(
            &soh_path,
            format!(r#"{{"feature_names":[{names}],"weights":[{weights}],"intercept":95.0}}"#),
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.artifacts.soc_model = Some(soc_path);
        config.artifacts.soh_model = Some(soh_path);
        let mut monitor = BatteryMonitor::from_config(&config).unwrap();
        let status = monitor.estimation_status();
        assert_eq!(status.soc_backing, SocBacking::SequenceModel);
        assert_eq!(status.soh_backing, SohBacking::RegressionModel);

        let frame = monitor.ingest(sample(0.0, 360.0, 0.0, 30.0));
        assert!((frame.soc_percent - 90.0).abs() < 1e-12);
        // Fraction output 0.6 scales to 60; degraded chemistry leaves the
        // gain at 1.
        let frame = monitor.ingest(sample(1.0, 360.0, 0.0, 30.0));
        assert!((frame.soc_percent - 60.0).abs() < 1e-9);
        // SOH raws are buffered but the warmup hold is still on.
        assert!((frame.soh_percent - 100.0).abs() < 1e-12);
    }

    #[test]
    fn frames_serialize_for_downstream_consumers() {
        let config = AppConfig::default();
        let mut monitor = BatteryMonitor::from_config(&config).unwrap();
        let frame = monitor.ingest(sample(0.0, 360.0, -50.0, 30.0));
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"soc_percent\""));
        assert!(json.contains("\"coulomb-ocv\""));
        assert!(json.contains("\"nominal\""));
    }
}
