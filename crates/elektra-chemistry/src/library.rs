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
use tracing::{info, warn};

use crate::curve::Electrode;
use crate::features::{try_features_from_file, ChemistryFeatureSet};

/// Chemistry features for both electrodes, loaded once at startup and shared
/// immutably with the estimators.
///
/// Loading never fails: an electrode whose curve file is missing or unusable
/// carries the zero feature set and is flagged as degraded so the monitor can
/// surface it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChemistryLibrary {
    anode: ChemistryFeatureSet,
    cathode: ChemistryFeatureSet,
    anode_degraded: bool,
    cathode_degraded: bool,
}

impl ChemistryLibrary {
    pub fn load(anode_path: &Path, cathode_path: &Path) -> Self {
        let (anode, anode_degraded) = Self::load_electrode(Electrode::Anode, anode_path);
        let (cathode, cathode_degraded) = Self::load_electrode(Electrode::Cathode, cathode_path);
        info!(anode_degraded, cathode_degraded, "chemistry library ready");
        Self {
            anode,
            cathode,
            anode_degraded,
            cathode_degraded,
        }
    }

    /// Build a library from already-extracted feature sets.
    pub fn from_features(anode: ChemistryFeatureSet, cathode: ChemistryFeatureSet) -> Self {
        Self {
            anode,
            cathode,
            anode_degraded: false,
            cathode_degraded: false,
        }
    }

    fn load_electrode(electrode: Electrode, path: &Path) -> (ChemistryFeatureSet, bool) {
        match try_features_from_file(path, electrode) {
            Ok(features) => {
                info!(
                    electrode = %electrode,
                    path = %path.display(),
                    area = features.area,
                    peak_count = features.peak_count,
                    "chemistry features extracted"
                );
                (features, false)
            }
            Err(err) => {
                warn!(
                    electrode = %electrode,
                    path = %path.display(),
                    error = %err,
                    "curve unusable; substituting zero features"
                );
                (ChemistryFeatureSet::zeroed(), true)
            }
        }
    }

    pub fn anode(&self) -> ChemistryFeatureSet {
        self.anode
    }

    pub fn cathode(&self) -> ChemistryFeatureSet {
        self.cathode
    }

    pub fn anode_degraded(&self) -> bool {
        self.anode_degraded
    }

    pub fn cathode_degraded(&self) -> bool {
        self.cathode_degraded
    }

    /// True when at least one electrode fell back to the zero set.
    pub fn degraded(&self) -> bool {
        self.anode_degraded || self.cathode_degraded
    }
}
