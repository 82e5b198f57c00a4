//! ---
//! elektra_section: "11-simulation"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Synthetic EV telemetry generation and scenario replay."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::info;

use elektra_common::config::AppConfig;

use crate::generator::EvSignalGenerator;
use crate::telemetry::TelemetrySample;

/// Raw row representation when deserializing recorded telemetry.
#[derive(Debug, Deserialize)]
pub struct ScenarioRow {
    pub time: f64,
    pub voltage: f64,
    pub current: f64,
    pub temperature: f64,
}

/// Replays recorded telemetry, cycling once the scenario is exhausted so
/// soak runs never starve the monitor.
#[derive(Debug, Default, Clone)]
pub struct ReplayEngine {
    samples: Vec<TelemetrySample>,
    cursor: usize,
}

impl ReplayEngine {
    pub fn from_path(path: &Path) -> Result<Self> {
        let engine = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(path),
            Some("csv") => Self::from_csv(path),
            _ => anyhow::bail!("unsupported scenario format: {}", path.display()),
        }?;
        info!(path = %path.display(), samples = engine.samples.len(), "scenario loaded");
        Ok(engine)
    }

    pub fn next_sample(&mut self) -> Option<TelemetrySample> {
        if self.samples.is_empty() {
            return None;
        }
        let sample = self.samples[self.cursor];
        self.cursor = (self.cursor + 1) % self.samples.len();
        Some(sample)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn from_json(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read scenario file {}", path.display()))?;
        let rows: Vec<ScenarioRow> = serde_json::from_str(&contents)
            .with_context(|| format!("invalid scenario JSON {}", path.display()))?;
        Ok(Self {
            samples: rows.into_iter().map(Self::row_to_sample).collect(),
            cursor: 0,
        })
    }

    fn from_csv(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)
            .with_context(|| format!("unable to open scenario csv {}", path.display()))?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut samples = Vec::new();
        for row in reader.deserialize::<ScenarioRow>() {
            let raw = row.with_context(|| format!("invalid scenario row in {}", path.display()))?;
            samples.push(Self::row_to_sample(raw));
        }
        Ok(Self { samples, cursor: 0 })
    }

    fn row_to_sample(row: ScenarioRow) -> TelemetrySample {
        TelemetrySample::new(row.time, row.voltage, row.current, row.temperature)
    }
}

/// Telemetry origin for the daemon loop: live physics model or recorded
/// scenario.
#[derive(Debug)]
pub enum TelemetrySource {
    Generator(EvSignalGenerator),
    Replay(ReplayEngine),
}

impl TelemetrySource {
    /// Build the source the configuration asks for: a replay engine when a
    /// scenario file is set, the physics generator otherwise.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        match &config.simulation.scenario_file {
            Some(path) => Ok(Self::Replay(ReplayEngine::from_path(path)?)),
            None => Ok(Self::Generator(EvSignalGenerator::new(
                &config.battery,
                &config.simulation,
                config.estimation.initial_soc,
            ))),
        }
    }

    pub fn next_sample(&mut self, real_dt: f64, speed_factor: f64) -> Option<TelemetrySample> {
        match self {
            TelemetrySource::Generator(generator) => Some(generator.step(real_dt, speed_factor)),
            TelemetrySource::Replay(replay) => replay.next_sample(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TelemetrySource::Generator(_) => "generator",
            TelemetrySource::Replay(_) => "replay",
        }
    }

    pub fn generator_mut(&mut self) -> Option<&mut EvSignalGenerator> {
        match self {
            TelemetrySource::Generator(generator) => Some(generator),
            TelemetrySource::Replay(_) => None,
        }
    }
}
