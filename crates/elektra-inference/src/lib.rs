//! ---
//! elektra_section: "08-state-estimation"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Online SOC/SOH estimation and model artifact handling."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
//! State estimation for the Elektra battery monitor.
//!
//! Two stateful estimators live here. [`SocEstimator`] integrates pack
//! current between samples and anchors itself to rest voltage; it can be
//! upgraded to a learned sequence model by shipping a [`SocModelArtifact`].
//! [`SohEstimator`] assembles the fixed-order health feature vector and
//! smooths the per-tick regression output; without a [`SohModelArtifact`] it
//! degrades to a documented linear decay. Artifact loading is optional: a
//! missing file selects the physics backing, a corrupt file is an error.

pub mod artifacts;
pub mod errors;
pub mod features;
pub mod soc;
pub mod soh;

pub use artifacts::{
    load_soc_artifact, load_soh_artifact, ScalerBounds, SocModelArtifact, SohModelArtifact,
};
pub use errors::{InferenceError, Result};
pub use features::{assemble_feature_vector, DynamicFeatures, FEATURE_ORDER};
pub use soc::{SocBacking, SocEstimator};
pub use soh::{SohBacking, SohEstimator};
