//! ---
//! elektra_section: "15-testing-qa"
//! elektra_subsection: "integration-tests"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "End-to-end monitor pipeline tests over synthetic and replayed telemetry."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::fs::File;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;

use elektra_chemistry::{ChemistryLibrary, Electrode};
use elektra_common::config::{AppConfig, OperationMode};
use elektra_core::BatteryMonitor;
use elektra_inference::{SocBacking, SohBacking, FEATURE_ORDER};
use elektra_safety::SafetyAlert;
use elektra_sim::{DrivePhase, EvSignalGenerator, TelemetrySample, TelemetrySource};

/// Synthesize both builtin electrode profiles into `dir` and return the paths.
fn write_curves(dir: &Path) -> (PathBuf, PathBuf) {
    let mut rng = StdRng::seed_from_u64(11);
    let anode = dir.join("dv_dq_anode.csv");
    let cathode = dir.join("dv_dq_cathode.csv");
    for (electrode, path) in [(Electrode::Anode, &anode), (Electrode::Cathode, &cathode)] {
        let curve = electrode.synthesize(0.05, 400, &mut rng);
        let mut writer = csv::Writer::from_writer(File::create(path).unwrap());
        for point in &curve {
            writer.serialize(point).unwrap();
        }
        writer.flush().unwrap();
    }
    (anode, cathode)
}

/// Default configuration rewired to freshly synthesized curve files.
fn config_with_curves(dir: &Path) -> AppConfig {
    let (anode, cathode) = write_curves(dir);
    let mut config = AppConfig::default();
    config.artifacts.anode_curve = anode;
    config.artifacts.cathode_curve = cathode;
    config
}

fn write_scenario(path: &Path, rows: &[TelemetrySample]) {
    let mut writer = csv::Writer::from_writer(File::create(path).unwrap());
    for row in rows {
        writer.serialize(row).unwrap();
    }
    writer.flush().unwrap();
}

#[test]
fn discharge_run_tracks_declining_charge() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_curves(dir.path());
    let mut monitor = BatteryMonitor::from_config(&config).unwrap();
    let status = monitor.estimation_status();
    assert!(!status.chemistry_degraded);
    assert_eq!(status.soc_backing, SocBacking::CoulombOcv);
    assert_eq!(status.soh_backing, SohBacking::LinearDecay);

    let mut generator = EvSignalGenerator::new(
        &config.battery,
        &config.simulation,
        config.estimation.initial_soc,
    );
    let mut last = config.estimation.initial_soc;
    for tick in 1..=60 {
        let sample = generator.step(1.0, config.simulation.speed_factor);
        let frame = monitor.ingest(sample);
        assert_eq!(frame.tick, tick);
        assert!((0.0..=100.0).contains(&frame.soc_percent));
        assert!((0.0..=100.0).contains(&frame.soh_percent));
        assert!(!frame.alerts.is_empty());
        last = frame.soc_percent;
    }
    assert!(
        last < config.estimation.initial_soc,
        "an hour and a half of simulated driving must draw the pack down, got {last}"
    );
    assert_eq!(monitor.history().len(), config.estimation.history_window);
}

#[test]
fn replayed_scenario_cycles_and_holds_on_rewind() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_curves(dir.path());
    let scenario = dir.path().join("lab-run.csv");
    write_scenario(
        &scenario,
        &[
            TelemetrySample::new(0.0, 353.0, -36.0, 30.0),
            TelemetrySample::new(10.0, 352.0, -36.0, 30.0),
            TelemetrySample::new(20.0, 351.0, -36.0, 30.0),
        ],
    );
    config.simulation.scenario_file = Some(scenario);

    let mut source = TelemetrySource::from_config(&config).unwrap();
    assert_eq!(source.kind(), "replay");
    let mut monitor = BatteryMonitor::from_config(&config).unwrap();

    let mut trace = Vec::new();
    for _ in 0..5 {
        let sample = source
            .next_sample(1.0, config.simulation.speed_factor)
            .unwrap();
        trace.push(monitor.ingest(sample).soc_percent);
    }

    // 36 A over 10 s against a 100 Ah pack moves SOC by exactly 0.1 points.
    // The fourth sample rewinds the scenario clock, which pins the estimate.
    let expected = [90.0, 89.9, 89.8, 89.8, 89.7];
    for (got, want) in trace.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "soc trace {trace:?}");
    }
    assert_eq!(monitor.tick(), 5);
}

#[test]
fn missing_artifacts_degrade_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.artifacts.anode_curve = dir.path().join("absent_anode.csv");
    config.artifacts.cathode_curve = dir.path().join("absent_cathode.csv");
    config.artifacts.soc_model = Some(dir.path().join("absent_soc.json"));
    config.artifacts.soh_model = Some(dir.path().join("absent_soh.json"));

    let mut monitor = BatteryMonitor::from_config(&config).unwrap();
    let status = monitor.estimation_status();
    assert!(status.chemistry_degraded);
    assert_eq!(status.soc_backing, SocBacking::CoulombOcv);
    assert_eq!(status.soh_backing, SohBacking::LinearDecay);

    let frame = monitor.ingest(TelemetrySample::new(0.0, 360.0, -40.0, 30.0));
    assert!((frame.soc_percent - config.estimation.initial_soc).abs() < 1e-12);
    assert!((frame.soh_percent - config.estimation.initial_soh).abs() < 1e-12);
    assert_eq!(frame.alerts, vec![SafetyAlert::Nominal]);
}

#[test]
fn window_temperature_spike_raises_overheat() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_curves(dir.path());
    let scenario = dir.path().join("hot-spike.csv");
    write_scenario(
        &scenario,
        &[
            TelemetrySample::new(0.0, 360.0, -10.0, 25.0),
            TelemetrySample::new(10.0, 360.0, -10.0, 56.0),
            TelemetrySample::new(20.0, 360.0, -10.0, 25.0),
        ],
    );
    config.simulation.scenario_file = Some(scenario);

    let mut source = TelemetrySource::from_config(&config).unwrap();
    let mut monitor = BatteryMonitor::from_config(&config).unwrap();

    let first = monitor.ingest(source.next_sample(1.0, 1.0).unwrap());
    assert_eq!(first.alerts, vec![SafetyAlert::Nominal]);

    let second = monitor.ingest(source.next_sample(1.0, 1.0).unwrap());
    assert!(second.alerts.contains(&SafetyAlert::Overheat));
    assert!((second.window_max_temperature - 56.0).abs() < 1e-12);

    // The spike stays inside the rolling window even after cooler samples.
    let third = monitor.ingest(source.next_sample(1.0, 1.0).unwrap());
    assert!(third.alerts.contains(&SafetyAlert::Overheat));
}

#[test]
fn model_artifacts_switch_the_backings() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_curves(dir.path());

    let soc_path = dir.path().join("soc_sequence.json");
    let soc_blob = serde_json::json!({
        "window": 2,
        "weights": vec![0.0; 6],
        "bias": 0.55,
    });
    std::fs::write(&soc_path, soc_blob.to_string()).unwrap();

    let soh_path = dir.path().join("soh_regression.json");
    let soh_blob = serde_json::json!({
        "feature_names": FEATURE_ORDER,
        "weights": vec![0.0; FEATURE_ORDER.len()],
        "intercept": 88.0,
    });
    std::fs::write(&soh_path, soh_blob.to_string()).unwrap();

    config.artifacts.soc_model = Some(soc_path);
    config.artifacts.soh_model = Some(soh_path);

    let mut monitor = BatteryMonitor::from_config(&config).unwrap();
    let status = monitor.estimation_status();
    assert_eq!(status.soc_backing, SocBacking::SequenceModel);
    assert_eq!(status.soh_backing, SohBacking::RegressionModel);

    let library = ChemistryLibrary::load(
        &config.artifacts.anode_curve,
        &config.artifacts.cathode_curve,
    );
    let gain = 1.0 + 0.03 * (library.anode().mean + library.cathode().mean);

    let first = monitor.ingest(TelemetrySample::new(0.0, 353.28, 0.0, 30.0));
    assert!((first.soc_percent - config.estimation.initial_soc).abs() < 1e-12);

    // Second sample fills the two-wide window: a flat 0.55 head scales to
    // percent and picks up the chemistry gain computed from the same curves.
    let second = monitor.ingest(TelemetrySample::new(10.0, 353.28, 0.0, 30.0));
    let expected = (0.55 * 100.0 * gain).clamp(0.0, 100.0);
    assert!((second.soc_percent - expected).abs() < 1e-9);
    // Raw regression output is buffered; the smoothed estimate holds the prior.
    assert!((second.soh_percent - config.estimation.initial_soh).abs() < 1e-12);
}

#[test]
fn charge_soak_settles_into_constant_voltage() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_curves(dir.path());
    config.simulation.initial_mode = OperationMode::Charge;
    config.estimation.initial_soc = 95.0;

    let mut monitor = BatteryMonitor::from_config(&config).unwrap();
    let mut generator = EvSignalGenerator::new(
        &config.battery,
        &config.simulation,
        config.estimation.initial_soc,
    );

    let mut last = None;
    for _ in 0..40 {
        let sample = generator.step(1.0, config.simulation.speed_factor);
        last = Some(monitor.ingest(sample));
    }

    let frame = last.unwrap();
    assert_eq!(generator.phase(), DrivePhase::ConstantVoltage);
    assert!(generator.soc() >= 95.0 && generator.soc() <= 100.0);
    assert!(frame.soc_percent > 90.0);
    assert_eq!(frame.alerts, vec![SafetyAlert::Nominal]);
}
