//! ---
//! elektra_section: "05-chemistry-features"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "dV/dQ curve tooling and chemistry feature extraction."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::curve::{CurvePoint, Electrode};

/// Point count of the shipped curve fixtures.
pub const PROFILE_POINTS: usize = 1000;

/// Sensor-noise sigma baked into the shipped curve fixtures.
pub const PROFILE_NOISE_SIGMA: f64 = 0.05;

/// Gaussian component of a synthetic dV/dQ profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakSpec {
    pub amplitude: f64,
    pub center: f64,
    pub width: f64,
}

impl PeakSpec {
    fn evaluate(&self, voltage: f64) -> f64 {
        let delta = voltage - self.center;
        self.amplitude * (-(delta * delta) / (2.0 * self.width * self.width)).exp()
    }
}

/// Graphite/silicon anode peak set. Staging transitions show up as negative
/// dips, rectified to positive in [`Electrode::synthesize`] because the
/// feature extractor counts positive maxima.
pub fn anode_peaks() -> Vec<PeakSpec> {
    vec![
        // Major graphite stage 1
        PeakSpec {
            amplitude: -30.0,
            center: 0.10,
            width: 0.02,
        },
        // Graphite stage 2
        PeakSpec {
            amplitude: -15.0,
            center: 0.21,
            width: 0.04,
        },
        // Silicon tail
        PeakSpec {
            amplitude: -8.0,
            center: 0.50,
            width: 0.15,
        },
    ]
}

/// NCA cathode peak set over cell voltage.
pub fn cathode_peaks() -> Vec<PeakSpec> {
    vec![
        PeakSpec {
            amplitude: 5.0,
            center: 3.6,
            width: 0.10,
        },
        // Major nickel peak
        PeakSpec {
            amplitude: 12.0,
            center: 3.8,
            width: 0.08,
        },
        // High-voltage phase
        PeakSpec {
            amplitude: 8.0,
            center: 4.1,
            width: 0.09,
        },
    ]
}

pub const ANODE_RANGE: (f64, f64) = (0.0, 1.5);
pub const CATHODE_RANGE: (f64, f64) = (3.0, 4.3);

/// Synthesize a dV/dQ profile as a Gaussian mixture plus sensor noise, sampled
/// on an even grid over `range`.
pub fn synthesize_profile<R: Rng>(
    range: (f64, f64),
    peaks: &[PeakSpec],
    noise_sigma: f64,
    points: usize,
    rng: &mut R,
) -> Vec<CurvePoint> {
    let noise = Normal::new(0.0, noise_sigma).expect("noise sigma must be non-negative");
    let count = points.max(2);
    let step = (range.1 - range.0) / (count - 1) as f64;
    (0..count)
        .map(|index| {
            let voltage = range.0 + step * index as f64;
            let mut dvdq = peaks.iter().map(|peak| peak.evaluate(voltage)).sum::<f64>();
            dvdq += noise.sample(rng);
            CurvePoint { voltage, dvdq }
        })
        .collect()
}

impl Electrode {
    pub fn peaks(&self) -> Vec<PeakSpec> {
        match self {
            Electrode::Anode => anode_peaks(),
            Electrode::Cathode => cathode_peaks(),
        }
    }

    pub fn voltage_range(&self) -> (f64, f64) {
        match self {
            Electrode::Anode => ANODE_RANGE,
            Electrode::Cathode => CATHODE_RANGE,
        }
    }

    /// Synthesize this electrode's builtin profile. The anode curve is folded
    /// positive after noise is applied.
    pub fn synthesize<R: Rng>(
        &self,
        noise_sigma: f64,
        points: usize,
        rng: &mut R,
    ) -> Vec<CurvePoint> {
        let mut curve =
            synthesize_profile(self.voltage_range(), &self.peaks(), noise_sigma, points, rng);
        if matches!(self, Electrode::Anode) {
            for point in &mut curve {
                point.dvdq = point.dvdq.abs();
            }
        }
        curve
    }
}
