//! ---
//! elektra_section: "08-state-estimation"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Online SOC/SOH estimation and model artifact handling."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, InferenceError>;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model artifact {path} is malformed: {source}")]
    MalformedArtifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model artifact {path} carries {actual} weights; expected {expected}")]
    WeightCountMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    #[error("model artifact {path} lists {actual} features; pipeline produces {expected}")]
    FeatureCountMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    #[error(
        "feature order mismatch in {path} at position {position}: artifact says {found:?}, \
         pipeline produces {expected:?}"
    )]
    FeatureOrderMismatch {
        path: PathBuf,
        position: usize,
        expected: String,
        found: String,
    },
    #[error("model artifact {path}: {field} must be {requirement}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        requirement: &'static str,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
