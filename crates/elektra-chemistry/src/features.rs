//! ---
//! elektra_section: "05-chemistry-features"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "dV/dQ curve tooling and chemistry feature extraction."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::curve::{read_curve, CurvePoint, Electrode};
use crate::errors::{ChemistryError, Result};

/// Scalar descriptors of one electrode's differential-voltage curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct ChemistryFeatureSet {
    /// Trapezoidal integral of dV/dQ over the sampled voltage range.
    pub area: f64,
    /// Arithmetic mean of the dV/dQ samples.
    pub mean: f64,
    /// Count of strict local maxima; plateaus and endpoints never qualify.
    pub peak_count: u32,
}

impl ChemistryFeatureSet {
    /// The all-zero set substituted when a curve cannot be used.
    pub fn zeroed() -> Self {
        Self::default()
    }
}

/// Extract the feature set from an in-memory curve. Fewer than two points
/// cannot be integrated and is an error.
pub fn extract_features(points: &[CurvePoint], electrode: Electrode) -> Result<ChemistryFeatureSet> {
    if points.len() < 2 {
        return Err(ChemistryError::CurveTooShort {
            electrode,
            points: points.len(),
        });
    }
    Ok(ChemistryFeatureSet {
        area: trapezoid_area(points),
        mean: mean_value(points),
        peak_count: strict_peak_count(points),
    })
}

/// Read a curve file and extract its features in one step.
pub fn try_features_from_file(path: &Path, electrode: Electrode) -> Result<ChemistryFeatureSet> {
    let points = read_curve(path)?;
    extract_features(&points, electrode)
}

/// Extract features from a curve file, degrading to the zero set when the
/// file is missing or unusable. The estimation pipeline keeps running on
/// zeroed chemistry instead of refusing to start.
pub fn features_from_file(path: &Path, electrode: Electrode) -> ChemistryFeatureSet {
    match try_features_from_file(path, electrode) {
        Ok(features) => features,
        Err(err) => {
            warn!(
                electrode = %electrode,
                path = %path.display(),
                error = %err,
                "curve unusable; substituting zero features"
            );
            ChemistryFeatureSet::zeroed()
        }
    }
}

/// Trapezoidal rule over unevenly spaced samples. Fewer than two points
/// integrate to zero.
pub fn trapezoid_area(points: &[CurvePoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| 0.5 * (pair[1].voltage - pair[0].voltage) * (pair[1].dvdq + pair[0].dvdq))
        .sum()
}

/// Mean of the dV/dQ samples; an empty curve yields 0.0 rather than NaN.
pub fn mean_value(points: &[CurvePoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|point| point.dvdq).sum::<f64>() / points.len() as f64
}

/// Count samples strictly above both neighbours.
pub fn strict_peak_count(points: &[CurvePoint]) -> u32 {
    points
        .windows(3)
        .filter(|triple| triple[1].dvdq > triple[0].dvdq && triple[1].dvdq > triple[2].dvdq)
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn curve_from(values: &[(f64, f64)]) -> Vec<CurvePoint> {
        values
            .iter()
            .map(|&(voltage, dvdq)| CurvePoint { voltage, dvdq })
            .collect()
    }

    #[test]
    fn trapezoid_matches_triangle_area() {
        let points = curve_from(&[(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]);
        assert!((trapezoid_area(&points) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn trapezoid_handles_uneven_spacing() {
        let points = curve_from(&[(0.0, 1.0), (0.5, 1.0), (2.0, 1.0)]);
        assert!((trapezoid_area(&points) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn peak_count_requires_strict_maxima() {
        // A plateau top is not a strict maximum.
        let plateau = curve_from(&[(0.0, 0.0), (1.0, 1.0), (2.0, 1.0), (3.0, 0.0)]);
        assert_eq!(strict_peak_count(&plateau), 0);

        let twin_peaks = curve_from(&[
            (0.0, 0.0),
            (1.0, 1.0),
            (2.0, 0.0),
            (3.0, 2.0),
            (4.0, 0.0),
        ]);
        assert_eq!(strict_peak_count(&twin_peaks), 2);
    }

    #[test]
    fn endpoints_never_count_as_peaks() {
        let rising = curve_from(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(strict_peak_count(&rising), 0);
    }

    #[test]
    fn mean_averages_samples() {
        let points = curve_from(&[(0.0, 1.0), (1.0, 2.0), (2.0, 6.0)]);
        assert!((mean_value(&points) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn short_curves_are_rejected() {
        let single = curve_from(&[(0.0, 3.0)]);
        let result = extract_features(&single, Electrode::Anode);
        assert!(matches!(
            result,
            Err(ChemistryError::CurveTooShort { points: 1, .. })
        ));
    }

    #[test]
    fn file_extraction_degrades_to_zero_set() {
        let dir = tempfile::tempdir().unwrap();
        let features = features_from_file(&dir.path().join("absent.csv"), Electrode::Cathode);
        assert_eq!(features, ChemistryFeatureSet::zeroed());
    }

    #[test]
    fn file_extraction_reads_valid_curves() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "voltage,dvdq").unwrap();
        writeln!(file, "3.0,1.0").unwrap();
        writeln!(file, "3.5,3.0").unwrap();
        writeln!(file, "4.0,1.0").unwrap();
        file.flush().unwrap();
        let features = features_from_file(file.path(), Electrode::Cathode);
        assert!((features.area - 2.0).abs() < 1e-12);
        assert!((features.mean - 5.0 / 3.0).abs() < 1e-12);
        assert_eq!(features.peak_count, 1);
    }
}
