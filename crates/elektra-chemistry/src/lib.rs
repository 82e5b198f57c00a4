//! ---
//! elektra_section: "05-chemistry-features"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "dV/dQ curve tooling and chemistry feature extraction."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
//! Differential-voltage (dV/dQ) analysis for the Elektra workspace: curve CSV
//! loading, scalar feature extraction for the SOH model, and the Gaussian-peak
//! profile synthesizer behind the shipped curve fixtures.

pub mod curve;
pub mod errors;
pub mod features;
pub mod library;
pub mod profile;

pub use curve::{read_curve, CurvePoint, Electrode};
pub use errors::{ChemistryError, Result};
pub use features::{
    extract_features, features_from_file, mean_value, strict_peak_count, trapezoid_area,
    try_features_from_file, ChemistryFeatureSet,
};
pub use library::ChemistryLibrary;
pub use profile::{
    anode_peaks, cathode_peaks, synthesize_profile, PeakSpec, ANODE_RANGE, CATHODE_RANGE,
    PROFILE_NOISE_SIGMA, PROFILE_POINTS,
};
