//! ---
//! elektra_section: "01-core-functionality"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Shared configuration primitives for the estimation runtime."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_pack_capacity_ah() -> f64 {
    100.0
}

fn default_cell_capacity_ah() -> f64 {
    2.5
}

fn default_series_cells() -> u32 {
    96
}

fn default_internal_resistance_ohm() -> f64 {
    0.05
}

fn default_capacity_ratio() -> f64 {
    0.95
}

fn default_delta_capacity() -> f64 {
    -0.002
}

fn default_anode_curve() -> PathBuf {
    PathBuf::from("data/dv_dq_anode.csv")
}

fn default_cathode_curve() -> PathBuf {
    PathBuf::from("data/dv_dq_cathode.csv")
}

fn default_initial_soc() -> f64 {
    90.0
}

fn default_initial_soh() -> f64 {
    100.0
}

fn default_history_window() -> usize {
    30
}

fn default_rolling_std_window() -> usize {
    10
}

fn default_soh_buffer_capacity() -> usize {
    20
}

fn default_soh_warmup() -> usize {
    5
}

fn default_soh_smoothing_alpha() -> f64 {
    0.1
}

fn default_cycle_accel() -> f64 {
    5.0
}

fn default_low_soc() -> f64 {
    15.0
}

fn default_degraded_soh() -> f64 {
    70.0
}

fn default_overheat_temp() -> f64 {
    50.0
}

fn default_simulation_seed() -> u64 {
    0xE1EC
}

fn default_speed_factor() -> f64 {
    100.0
}

fn default_tick_interval() -> Duration {
    Duration::from_millis(1000)
}

fn default_initial_mode() -> OperationMode {
    OperationMode::Discharge
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Primary configuration object for the Elektra runtime.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub battery: BatteryConfig,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub estimation: EstimationConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "ELEKTRA_CONFIG";

    /// Load configuration from disk, respecting the `ELEKTRA_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants across all sections.
    pub fn validate(&self) -> Result<()> {
        self.battery.validate()?;
        self.estimation.validate()?;
        self.safety.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Operating mode commanded to the signal generator.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Standby,
    #[default]
    Discharge,
    Charge,
}

impl OperationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationMode::Standby => "standby",
            OperationMode::Discharge => "discharge",
            OperationMode::Charge => "charge",
        }
    }
}

impl std::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standby" => Ok(OperationMode::Standby),
            "discharge" => Ok(OperationMode::Discharge),
            "charge" => Ok(OperationMode::Charge),
            other => Err(format!("unknown operation mode: {}", other)),
        }
    }
}

/// Electrical profile of the monitored pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Usable pack capacity integrated by the coulomb counter, in Ah.
    #[serde(default = "default_pack_capacity_ah")]
    pub pack_capacity_ah: f64,
    /// Nameplate cell capacity reported to the SOH feature vector, in Ah.
    #[serde(default = "default_cell_capacity_ah")]
    pub cell_capacity_ah: f64,
    /// Series cell count mapping pack voltage to cell voltage.
    #[serde(default = "default_series_cells")]
    pub series_cells: u32,
    /// Lumped pack resistance used for IR sag, in ohms.
    #[serde(default = "default_internal_resistance_ohm")]
    pub internal_resistance_ohm: f64,
    /// Present-to-nameplate capacity ratio from the last checkup.
    #[serde(default = "default_capacity_ratio")]
    pub capacity_ratio: f64,
    /// Capacity trend per cycle from the last checkup, in Ah.
    #[serde(default = "default_delta_capacity")]
    pub delta_capacity: f64,
}

impl BatteryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.pack_capacity_ah <= 0.0 {
            return Err(anyhow!("battery.pack_capacity_ah must be positive"));
        }
        if self.cell_capacity_ah <= 0.0 {
            return Err(anyhow!("battery.cell_capacity_ah must be positive"));
        }
        if self.series_cells == 0 {
            return Err(anyhow!("battery.series_cells must be at least 1"));
        }
        if self.internal_resistance_ohm < 0.0 {
            return Err(anyhow!("battery.internal_resistance_ohm cannot be negative"));
        }
        Ok(())
    }

    /// Pack capacity expressed in amp-seconds, the coulomb counter unit.
    pub fn pack_capacity_as(&self) -> f64 {
        self.pack_capacity_ah * 3600.0
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            pack_capacity_ah: default_pack_capacity_ah(),
            cell_capacity_ah: default_cell_capacity_ah(),
            series_cells: default_series_cells(),
            internal_resistance_ohm: default_internal_resistance_ohm(),
            capacity_ratio: default_capacity_ratio(),
            delta_capacity: default_delta_capacity(),
        }
    }
}

/// Paths to flat-file feature sources and serialized model blobs.
///
/// Curve and model loading happens once at startup; missing files engage the
/// documented degraded modes instead of failing the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    #[serde(default = "default_anode_curve")]
    pub anode_curve: PathBuf,
    #[serde(default = "default_cathode_curve")]
    pub cathode_curve: PathBuf,
    #[serde(default)]
    pub soc_model: Option<PathBuf>,
    #[serde(default)]
    pub soh_model: Option<PathBuf>,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            anode_curve: default_anode_curve(),
            cathode_curve: default_cathode_curve(),
            soc_model: None,
            soh_model: None,
        }
    }
}

/// Tunables for the SOC/SOH estimators and the rolling telemetry window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationConfig {
    /// Seed estimate returned by the SOC estimator before integration starts.
    #[serde(default = "default_initial_soc")]
    pub initial_soc: f64,
    /// Prior held by the SOH smoother until enough raw predictions buffer up.
    #[serde(default = "default_initial_soh")]
    pub initial_soh: f64,
    /// Capacity of the rolling telemetry history window, in samples.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Window length for the pandas-style rolling voltage std feature.
    #[serde(default = "default_rolling_std_window")]
    pub rolling_std_window: usize,
    /// FIFO capacity of the raw SOH prediction buffer.
    #[serde(default = "default_soh_buffer_capacity")]
    pub soh_buffer_capacity: usize,
    /// Buffered predictions required before the smoothed SOH starts moving.
    #[serde(default = "default_soh_warmup")]
    pub soh_warmup: usize,
    /// EMA weight applied to the buffer mean on each smoothed update.
    #[serde(default = "default_soh_smoothing_alpha")]
    pub soh_smoothing_alpha: f64,
    /// Cycles attributed per tick; >1 compresses pack aging for demos.
    #[serde(default = "default_cycle_accel")]
    pub cycle_accel: f64,
}

impl EstimationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.initial_soc) {
            return Err(anyhow!("estimation.initial_soc must lie in [0, 100]"));
        }
        if !(0.0..=100.0).contains(&self.initial_soh) {
            return Err(anyhow!("estimation.initial_soh must lie in [0, 100]"));
        }
        if self.history_window < 2 || self.history_window > 1000 {
            return Err(anyhow!("estimation.history_window must lie in [2, 1000]"));
        }
        if self.rolling_std_window < 2 || self.rolling_std_window > self.history_window {
            return Err(anyhow!(
                "estimation.rolling_std_window must lie in [2, history_window]"
            ));
        }
        if self.soh_warmup == 0 || self.soh_warmup > self.soh_buffer_capacity {
            return Err(anyhow!(
                "estimation.soh_warmup must lie in [1, soh_buffer_capacity]"
            ));
        }
        if !(0.0..=1.0).contains(&self.soh_smoothing_alpha) || self.soh_smoothing_alpha == 0.0 {
            return Err(anyhow!("estimation.soh_smoothing_alpha must lie in (0, 1]"));
        }
        if self.cycle_accel <= 0.0 {
            return Err(anyhow!("estimation.cycle_accel must be positive"));
        }
        Ok(())
    }
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            initial_soc: default_initial_soc(),
            initial_soh: default_initial_soh(),
            history_window: default_history_window(),
            rolling_std_window: default_rolling_std_window(),
            soh_buffer_capacity: default_soh_buffer_capacity(),
            soh_warmup: default_soh_warmup(),
            soh_smoothing_alpha: default_soh_smoothing_alpha(),
            cycle_accel: default_cycle_accel(),
        }
    }
}

/// Alert thresholds consumed by the safety rule evaluator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "default_low_soc")]
    pub low_soc: f64,
    #[serde(default = "default_degraded_soh")]
    pub degraded_soh: f64,
    #[serde(default = "default_overheat_temp")]
    pub overheat_temp: f64,
}

impl SafetyConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.low_soc) {
            return Err(anyhow!("safety.low_soc must lie in [0, 100]"));
        }
        if !(0.0..=100.0).contains(&self.degraded_soh) {
            return Err(anyhow!("safety.degraded_soh must lie in [0, 100]"));
        }
        Ok(())
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            low_soc: default_low_soc(),
            degraded_soh: default_degraded_soh(),
            overheat_temp: default_overheat_temp(),
        }
    }
}

/// Telemetry source settings for the daemon tick loop.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed for the generator RNG; fixed seeds reproduce a run exactly.
    #[serde(default = "default_simulation_seed")]
    pub random_seed: u64,
    /// Simulated seconds advanced per wall-clock second.
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f64,
    /// Wall-clock period of the tick loop.
    #[serde(default = "default_tick_interval")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub tick_interval: Duration,
    /// Operating mode the generator starts in.
    #[serde(default = "default_initial_mode")]
    pub initial_mode: OperationMode,
    /// When set, replay recorded telemetry from this file instead of
    /// synthesizing it.
    #[serde(default)]
    pub scenario_file: Option<PathBuf>,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.speed_factor <= 0.0 {
            return Err(anyhow!("simulation.speed_factor must be positive"));
        }
        if self.tick_interval.is_zero() {
            return Err(anyhow!("simulation.tick_interval must be positive"));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            random_seed: default_simulation_seed(),
            speed_factor: default_speed_factor(),
            tick_interval: default_tick_interval(),
            initial_mode: default_initial_mode(),
            scenario_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}
