//! ---
//! elektra_section: "08-state-estimation"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Online SOC/SOH estimation and model artifact handling."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use serde::Serialize;

use elektra_chemistry::ChemistryLibrary;

/// Exact training-time feature order of the SOH regression artifact.
///
/// This ordering is a hard contract: the model was fit on columns in this
/// sequence, and silently reordering them corrupts every prediction. Artifact
/// loading refuses any blob whose `feature_names` disagree.
pub const FEATURE_ORDER: [&str; 15] = [
    "cycle",
    "mean_voltage",
    "voltage_std",
    "min_voltage",
    "max_voltage",
    "capacity_ah",
    "capacity_ratio",
    "anode_dvdq_area",
    "anode_dvdq_peak_count",
    "anode_dvdq_mean",
    "cathode_dvdq_area",
    "cathode_dvdq_peak_count",
    "cathode_dvdq_mean",
    "delta_capacity",
    "rolling_voltage_std",
];

/// Per-tick inputs to the SOH feature vector, computed from the rolling
/// telemetry window and the pack profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DynamicFeatures {
    pub cycle: f64,
    pub mean_voltage: f64,
    pub voltage_std: f64,
    pub min_voltage: f64,
    pub max_voltage: f64,
    pub capacity_ah: f64,
    pub capacity_ratio: f64,
    pub delta_capacity: f64,
    pub rolling_voltage_std: f64,
}

/// Assemble the ordered feature vector the regression artifact was fit on,
/// merging per-tick dynamics with the static chemistry features.
pub fn assemble_feature_vector(
    dynamic: &DynamicFeatures,
    chemistry: &ChemistryLibrary,
) -> [f64; 15] {
    let anode = chemistry.anode();
    let cathode = chemistry.cathode();
    [
        dynamic.cycle,
        dynamic.mean_voltage,
        dynamic.voltage_std,
        dynamic.min_voltage,
        dynamic.max_voltage,
        dynamic.capacity_ah,
        dynamic.capacity_ratio,
        anode.area,
        f64::from(anode.peak_count),
        anode.mean,
        cathode.area,
        f64::from(cathode.peak_count),
        cathode.mean,
        dynamic.delta_capacity,
        dynamic.rolling_voltage_std,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use elektra_chemistry::ChemistryFeatureSet;

    fn sample_dynamics() -> DynamicFeatures {
        DynamicFeatures {
            cycle: 120.0,
            mean_voltage: 3.9,
            voltage_std: 0.05,
            min_voltage: 3.7,
            max_voltage: 4.1,
            capacity_ah: 2.5,
            capacity_ratio: 0.95,
            delta_capacity: -0.002,
            rolling_voltage_std: 0.04,
        }
    }

    #[test]
    fn vector_matches_training_order() {
        let chemistry = ChemistryLibrary::from_features(
            ChemistryFeatureSet {
                area: 1.5,
                mean: 0.8,
                peak_count: 3,
            },
            ChemistryFeatureSet {
                area: 6.0,
                mean: 2.1,
                peak_count: 2,
            },
        );
        let vector = assemble_feature_vector(&sample_dynamics(), &chemistry);
        assert_eq!(vector.len(), FEATURE_ORDER.len());
        assert_eq!(vector[0], 120.0); // cycle
        assert_eq!(vector[1], 3.9); // mean_voltage
        assert_eq!(vector[7], 1.5); // anode_dvdq_area
        assert_eq!(vector[8], 3.0); // anode_dvdq_peak_count
        assert_eq!(vector[9], 0.8); // anode_dvdq_mean
        assert_eq!(vector[10], 6.0); // cathode_dvdq_area
        assert_eq!(vector[12], 2.1); // cathode_dvdq_mean
        assert_eq!(vector[13], -0.002); // delta_capacity
        assert_eq!(vector[14], 0.04); // rolling_voltage_std
    }

    #[test]
    fn zeroed_chemistry_contributes_zero_entries() {
        let chemistry = ChemistryLibrary::from_features(
            ChemistryFeatureSet::zeroed(),
            ChemistryFeatureSet::zeroed(),
        );
        let vector = assemble_feature_vector(&sample_dynamics(), &chemistry);
        for index in [7, 8, 9, 10, 11, 12] {
            assert_eq!(vector[index], 0.0);
        }
    }
}
