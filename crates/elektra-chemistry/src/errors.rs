//! ---
//! elektra_section: "05-chemistry-features"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "dV/dQ curve tooling and chemistry feature extraction."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::path::PathBuf;

use thiserror::Error;

use crate::curve::Electrode;

pub type Result<T> = std::result::Result<T, ChemistryError>;

#[derive(Debug, Error)]
pub enum ChemistryError {
    #[error("curve file {path} is malformed: {source}")]
    MalformedCurve {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{electrode} curve has {points} points; need at least 2")]
    CurveTooShort { electrode: Electrode, points: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
