//! ---
//! elektra_section: "05-chemistry-features"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "dV/dQ curve tooling and chemistry feature extraction."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use crate::errors::{ChemistryError, Result};

/// One sample of a differential-voltage curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub voltage: f64,
    pub dvdq: f64,
}

/// Electrode side of the cell a curve describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Electrode {
    Anode,
    Cathode,
}

impl Electrode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Electrode::Anode => "anode",
            Electrode::Cathode => "cathode",
        }
    }

    /// Conventional file name of the shipped curve fixture.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Electrode::Anode => "dv_dq_anode.csv",
            Electrode::Cathode => "dv_dq_cathode.csv",
        }
    }
}

impl std::fmt::Display for Electrode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read a curve from a two-column CSV with a `voltage,dvdq` header row.
///
/// Rows are taken in file order; callers provide curves sorted by ascending
/// voltage.
pub fn read_curve(path: &Path) -> Result<Vec<CurvePoint>> {
    let file = fs::File::open(path)?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
    let mut points = Vec::new();
    for record in reader.deserialize::<CurvePoint>() {
        let point = record.map_err(|source| ChemistryError::MalformedCurve {
            path: path.to_path_buf(),
            source,
        })?;
        points.push(point);
    }
    Ok(points)
}
