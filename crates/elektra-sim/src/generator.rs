//! ---
//! elektra_section: "11-simulation"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Synthetic EV telemetry generation and scenario replay."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use rand::prelude::*;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use elektra_common::config::{BatteryConfig, OperationMode, SimulationConfig};

use crate::telemetry::TelemetrySample;

const AMBIENT_C: f64 = 25.0;
const TEMP_FLOOR_C: f64 = -10.0;
const TEMP_CEIL_C: f64 = 70.0;
const CELL_VOLTAGE_FLOOR: f64 = 3.0;
const CELL_VOLTAGE_CEIL: f64 = 4.25;

/// Speed-up beyond which the current low-pass is bypassed: the filter time
/// constant would be shorter than one compressed tick.
const LOWPASS_SPEED_LIMIT: f64 = 10.0;

/// Drive-cycle phase within an operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrivePhase {
    Idle,
    Accel,
    Cruise,
    Regen,
    ConstantCurrent,
    ConstantVoltage,
}

impl DrivePhase {
    /// Phase a freshly commanded mode starts in.
    pub fn initial(mode: OperationMode) -> Self {
        match mode {
            OperationMode::Standby | OperationMode::Discharge => DrivePhase::Idle,
            OperationMode::Charge => DrivePhase::ConstantCurrent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DrivePhase::Idle => "idle",
            DrivePhase::Accel => "accel",
            DrivePhase::Cruise => "cruise",
            DrivePhase::Regen => "regen",
            DrivePhase::ConstantCurrent => "constant-current",
            DrivePhase::ConstantVoltage => "constant-voltage",
        }
    }

    /// Scheduled duration in simulated seconds. `ConstantVoltage` holds until
    /// the mode changes, so it has no schedule.
    fn scheduled_secs(&self) -> Option<f64> {
        match self {
            DrivePhase::Idle => Some(30.0),
            DrivePhase::Accel => Some(15.0),
            DrivePhase::Cruise => Some(60.0),
            DrivePhase::Regen => Some(10.0),
            DrivePhase::ConstantCurrent => Some(120.0),
            DrivePhase::ConstantVoltage => None,
        }
    }

    fn next_discharge(&self) -> DrivePhase {
        match self {
            DrivePhase::Idle => DrivePhase::Accel,
            DrivePhase::Accel => DrivePhase::Cruise,
            DrivePhase::Cruise => DrivePhase::Regen,
            _ => DrivePhase::Idle,
        }
    }
}

impl std::fmt::Display for DrivePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cubic open-circuit voltage fit for an NCA cell: 3.2 V empty, 4.2 V full.
fn cell_ocv(soc_fraction: f64) -> f64 {
    let s = soc_fraction.clamp(0.0, 1.0);
    3.2 + s - 0.5 * s * s + 0.5 * s * s * s
}

/// Stateful physics model emitting synthetic pack telemetry.
///
/// The generator owns its entire state; mode changes come in through
/// [`EvSignalGenerator::set_mode`] and everything else advances inside
/// [`EvSignalGenerator::step`]. A fixed RNG seed reproduces a run exactly.
#[derive(Debug)]
pub struct EvSignalGenerator {
    battery: BatteryConfig,
    rng: StdRng,
    mode: OperationMode,
    phase: DrivePhase,
    phase_timer: f64,
    sim_time: f64,
    soc: f64,
    current: f64,
    temperature: f64,
}

impl EvSignalGenerator {
    pub fn new(battery: &BatteryConfig, simulation: &SimulationConfig, initial_soc: f64) -> Self {
        Self {
            battery: battery.clone(),
            rng: StdRng::seed_from_u64(simulation.random_seed),
            mode: simulation.initial_mode,
            phase: DrivePhase::initial(simulation.initial_mode),
            phase_timer: 0.0,
            sim_time: 0.0,
            soc: initial_soc.clamp(0.0, 100.0),
            current: 0.0,
            temperature: AMBIENT_C,
        }
    }

    /// Command a new operating mode. The phase machine restarts at the mode's
    /// initial phase with a zeroed phase timer.
    pub fn set_mode(&mut self, mode: OperationMode) {
        debug!(from = %self.mode, to = %mode, "generator mode change");
        self.mode = mode;
        self.phase = DrivePhase::initial(mode);
        self.phase_timer = 0.0;
    }

    /// Advance `real_dt * speed_factor` seconds of simulated time and emit the
    /// resulting telemetry sample.
    pub fn step(&mut self, real_dt: f64, speed_factor: f64) -> TelemetrySample {
        let sim_dt = real_dt * speed_factor;
        self.sim_time += sim_dt;
        self.advance_phase(sim_dt);
        let target = self.target_current();
        self.apply_current(target, speed_factor);
        self.integrate_soc(sim_dt);
        self.relax_temperature(sim_dt);
        let voltage = self.terminal_voltage();
        TelemetrySample::new(self.sim_time, voltage, self.current, self.temperature)
    }

    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    pub fn phase(&self) -> DrivePhase {
        self.phase
    }

    pub fn phase_timer(&self) -> f64 {
        self.phase_timer
    }

    /// Ground-truth SOC tracked by the physics model.
    pub fn soc(&self) -> f64 {
        self.soc
    }

    fn advance_phase(&mut self, sim_dt: f64) {
        self.phase_timer += sim_dt;
        match self.mode {
            // Standby has no drive cycle.
            OperationMode::Standby => {}
            OperationMode::Discharge => {
                if let Some(duration) = self.phase.scheduled_secs() {
                    if self.phase_timer >= duration {
                        self.phase = self.phase.next_discharge();
                        self.phase_timer = 0.0;
                    }
                }
            }
            OperationMode::Charge => {
                if self.phase == DrivePhase::ConstantCurrent {
                    let timed_out = match self.phase.scheduled_secs() {
                        Some(duration) => self.phase_timer >= duration,
                        None => false,
                    };
                    if timed_out || self.soc >= 80.0 {
                        self.phase = DrivePhase::ConstantVoltage;
                        self.phase_timer = 0.0;
                    }
                }
            }
        }
    }

    fn target_current(&mut self) -> f64 {
        match self.mode {
            OperationMode::Standby => self.gauss(-0.5, 0.2),
            OperationMode::Discharge => match self.phase {
                DrivePhase::Accel => self.gauss(-180.0, 10.0),
                DrivePhase::Cruise => self.gauss(-60.0, 5.0),
                DrivePhase::Regen => self.gauss(80.0, 8.0),
                _ => self.gauss(-2.0, 0.5),
            },
            OperationMode::Charge => match self.phase {
                DrivePhase::ConstantCurrent => self.gauss(80.0, 5.0),
                _ => {
                    if self.soc >= 98.0 {
                        0.0
                    } else {
                        let taper = (100.0 - self.soc).min(20.0);
                        self.gauss(taper, 0.5)
                    }
                }
            },
        }
    }

    fn apply_current(&mut self, target: f64, speed_factor: f64) {
        if speed_factor <= LOWPASS_SPEED_LIMIT {
            self.current = 0.9 * self.current + 0.1 * target + self.gauss(0.0, 0.5);
        } else {
            self.current = target + self.gauss(0.0, 2.0);
        }
    }

    fn integrate_soc(&mut self, sim_dt: f64) {
        let delta = self.current * sim_dt / 3600.0 / self.battery.pack_capacity_ah * 100.0;
        self.soc = (self.soc + delta).clamp(0.0, 100.0);
    }

    fn relax_temperature(&mut self, sim_dt: f64) {
        // Charging dissipates less heat per amp than discharging.
        let heating = if self.current >= 0.0 { 0.08 } else { 0.15 };
        let target = AMBIENT_C + heating * self.current.abs();
        let blend = (0.02 * sim_dt).min(1.0);
        self.temperature += (target - self.temperature) * blend;
        self.temperature += self.gauss(0.0, 0.05);
        self.temperature = self.temperature.clamp(TEMP_FLOOR_C, TEMP_CEIL_C);
    }

    fn terminal_voltage(&mut self) -> f64 {
        let cells = f64::from(self.battery.series_cells);
        let ocv = cells * cell_ocv(self.soc / 100.0);
        let sag = self.current * self.battery.internal_resistance_ohm;
        let noisy = ocv + sag + self.gauss(0.0, 0.25);
        noisy.clamp(cells * CELL_VOLTAGE_FLOOR, cells * CELL_VOLTAGE_CEIL)
    }

    fn gauss(&mut self, mean: f64, sigma: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mean + sigma * z
    }
}
