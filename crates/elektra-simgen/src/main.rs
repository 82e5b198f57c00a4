//! ---
//! elektra_section: "11-simulation"
//! elektra_subsection: "01-bootstrap"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Fixture generator for chemistry curves and telemetry scenarios."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use elektra_chemistry::{CurvePoint, Electrode, PROFILE_NOISE_SIGMA, PROFILE_POINTS};
use elektra_common::config::{BatteryConfig, OperationMode, SimulationConfig};
use elektra_common::version::VersionInfo;
use elektra_sim::{EvSignalGenerator, TelemetrySample};
use rand::rngs::StdRng;
use rand::SeedableRng;

const DEFAULT_SEED: u64 = 0xE1EC;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Standby,
    Discharge,
    Charge,
}

impl From<ModeArg> for OperationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Standby => OperationMode::Standby,
            ModeArg::Discharge => OperationMode::Discharge,
            ModeArg::Charge => OperationMode::Charge,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "Generate Elektra chemistry curves and telemetry scenario fixtures",
    long_about = None
)]
struct Cli {
    /// Print extended version information and exit
    #[arg(short = 'V', long = "version", action = ArgAction::SetTrue)]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Synthesize dV/dQ curve files for both electrodes
    Curves(CurvesArgs),
    /// Run the drive-cycle generator and capture a telemetry scenario
    Telemetry(TelemetryArgs),
}

#[derive(Debug, Args)]
struct CurvesArgs {
    /// Directory receiving dv_dq_anode.csv and dv_dq_cathode.csv
    #[arg(long, default_value = "data")]
    output_dir: PathBuf,

    /// Points per curve
    #[arg(long, default_value_t = PROFILE_POINTS)]
    points: usize,

    /// Gaussian noise sigma applied to each synthesized point
    #[arg(long, default_value_t = PROFILE_NOISE_SIGMA)]
    noise_sigma: f64,

    /// Random seed for the curve noise
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

#[derive(Debug, Args)]
struct TelemetryArgs {
    /// Output file path. Use '-' for stdout.
    #[arg(long, default_value = "scenario.csv")]
    output: PathBuf,

    /// Explicit output format when the extension is ambiguous
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Number of samples to generate
    #[arg(long, default_value_t = 120)]
    samples: u64,

    /// Wall-clock seconds represented by one sample before acceleration
    #[arg(long, default_value_t = 1.0)]
    tick_secs: f64,

    /// Simulated-time acceleration applied to each tick
    #[arg(long, default_value_t = 100.0)]
    speed_factor: f64,

    /// Operating mode driving the generator
    #[arg(long, value_enum, default_value_t = ModeArg::Discharge)]
    mode: ModeArg,

    /// Starting state of charge in percent
    #[arg(long, default_value_t = 90.0)]
    initial_soc: f64,

    /// Random seed for the generator
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("{}", VersionInfo::current().extended());
        return Ok(());
    }
    match cli.command {
        Some(Commands::Curves(args)) => run_curves(&args),
        Some(Commands::Telemetry(args)) => run_telemetry(&args),
        None => Err(anyhow!("a subcommand is required; try --help")),
    }
}

fn run_curves(args: &CurvesArgs) -> Result<()> {
    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            args.output_dir.display()
        )
    })?;
    let mut rng = StdRng::seed_from_u64(args.seed);
    for electrode in [Electrode::Anode, Electrode::Cathode] {
        let curve = electrode.synthesize(args.noise_sigma.max(0.0), args.points, &mut rng);
        let path = args.output_dir.join(electrode.default_file_name());
        write_curve(&path, &curve)?;
        eprintln!(
            "wrote {} {} points -> {}",
            curve.len(),
            electrode,
            path.display()
        );
    }
    Ok(())
}

fn write_curve(path: &Path, curve: &[CurvePoint]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create curve file {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    for point in curve {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

fn run_telemetry(args: &TelemetryArgs) -> Result<()> {
    let format = determine_format(&args.output, args.format);
    let samples = generate_samples(args)?;

    match format {
        OutputFormat::Csv => write_csv(&args.output, &samples)?,
        OutputFormat::Json => write_json(&args.output, &samples)?,
    }

    if args.output.as_os_str() != "-" {
        eprintln!(
            "generated {} samples ({} mode) -> {}",
            samples.len(),
            OperationMode::from(args.mode),
            args.output.display()
        );
    }
    Ok(())
}

fn generate_samples(args: &TelemetryArgs) -> Result<Vec<TelemetrySample>> {
    if args.samples == 0 {
        return Err(anyhow!("samples must be greater than zero"));
    }
    if args.tick_secs <= 0.0 {
        return Err(anyhow!("tick-secs must be greater than zero"));
    }
    if args.speed_factor <= 0.0 {
        return Err(anyhow!("speed-factor must be greater than zero"));
    }

    let simulation = SimulationConfig {
        random_seed: args.seed.unwrap_or(DEFAULT_SEED),
        speed_factor: args.speed_factor,
        initial_mode: args.mode.into(),
        ..SimulationConfig::default()
    };
    let mut generator =
        EvSignalGenerator::new(&BatteryConfig::default(), &simulation, args.initial_soc);

    let mut samples = Vec::with_capacity(args.samples as usize);
    for _ in 0..args.samples {
        samples.push(generator.step(args.tick_secs, args.speed_factor));
    }
    Ok(samples)
}

fn determine_format(path: &Path, override_format: Option<OutputFormat>) -> OutputFormat {
    if let Some(format) = override_format {
        return format;
    }
    if path.as_os_str() == "-" {
        return OutputFormat::Json;
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Csv,
    }
}

fn write_csv(output: &Path, samples: &[TelemetrySample]) -> Result<()> {
    let writer: Box<dyn Write> = if output.as_os_str() == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(
            File::create(output)
                .with_context(|| format!("failed to create output file {}", output.display()))?,
        )
    };
    let mut writer = csv::Writer::from_writer(writer);
    for sample in samples {
        writer.serialize(sample)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(output: &Path, samples: &[TelemetrySample]) -> Result<()> {
    if output.as_os_str() == "-" {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, samples)?;
        stdout.write_all(b"\n")?;
    } else {
        let file = File::create(output)
            .with_context(|| format!("failed to create output file {}", output.display()))?;
        serde_json::to_writer_pretty(file, samples)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use elektra_chemistry::read_curve;
    use elektra_sim::ReplayEngine;

    fn telemetry_args() -> TelemetryArgs {
        TelemetryArgs {
            output: PathBuf::from("scenario.csv"),
            format: None,
            samples: 20,
            tick_secs: 1.0,
            speed_factor: 10.0,
            mode: ModeArg::Discharge,
            initial_soc: 90.0,
            seed: Some(7),
        }
    }

    #[test]
    fn determine_format_follows_extension() {
        assert!(matches!(
            determine_format(Path::new("out.json"), None),
            OutputFormat::Json
        ));
        assert!(matches!(
            determine_format(Path::new("out.csv"), None),
            OutputFormat::Csv
        ));
        assert!(matches!(
            determine_format(Path::new("telemetry.data"), None),
            OutputFormat::Csv
        ));
    }

    #[test]
    fn determine_format_for_stdout_defaults_json() {
        assert!(matches!(
            determine_format(Path::new("-"), None),
            OutputFormat::Json
        ));
    }

    #[test]
    fn curves_land_in_the_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let args = CurvesArgs {
            output_dir: dir.path().to_path_buf(),
            points: 50,
            noise_sigma: 0.05,
            seed: 3,
        };
        run_curves(&args).unwrap();

        let anode = read_curve(&dir.path().join("dv_dq_anode.csv")).unwrap();
        let cathode = read_curve(&dir.path().join("dv_dq_cathode.csv")).unwrap();
        assert_eq!(anode.len(), 50);
        assert_eq!(cathode.len(), 50);
        assert!(anode.iter().all(|point| point.dvdq >= 0.0));
    }

    #[test]
    fn same_seed_reproduces_the_scenario() {
        let args = telemetry_args();
        let first = generate_samples(&args).unwrap();
        let second = generate_samples(&args).unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert!((a.voltage - b.voltage).abs() < 1e-12);
            assert!((a.current - b.current).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_samples_is_rejected() {
        let mut args = telemetry_args();
        args.samples = 0;
        assert!(generate_samples(&args).is_err());
    }

    #[test]
    fn generated_scenarios_replay_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("scenario.csv");
        let json_path = dir.path().join("scenario.json");
        let samples = generate_samples(&telemetry_args()).unwrap();
        write_csv(&csv_path, &samples).unwrap();
        write_json(&json_path, &samples).unwrap();

        let mut csv_replay = ReplayEngine::from_path(&csv_path).unwrap();
        let mut json_replay = ReplayEngine::from_path(&json_path).unwrap();
        assert_eq!(csv_replay.len(), samples.len());
        assert_eq!(json_replay.len(), samples.len());
        let from_csv = csv_replay.next_sample().unwrap();
        let from_json = json_replay.next_sample().unwrap();
        assert!((from_csv.voltage - samples[0].voltage).abs() < 1e-6);
        assert!((from_json.voltage - samples[0].voltage).abs() < 1e-9);
    }
}
