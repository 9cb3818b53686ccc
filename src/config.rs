// src/config.rs
//
// Run configuration written next to every output directory (config.json)
// and optionally read back to reproduce a run.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::DipoleResult;
use crate::params::DipoleParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub lattice: LatticeConfig,
    pub dipole: DipoleParams,
    pub fields: FieldConfig,
    pub run: RunInfo,
}

/// Simple cubic arrangement of macrocells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    /// Cell edge length (Å).
    pub cell_size: f64,
    pub atoms_per_cell: u32,
    /// Atomic moment in units of μ_B.
    pub moment_per_atom: f64,
    /// Direction of the initial uniform magnetisation.
    pub m_dir: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Uniform external induction (T).
    pub b_ext: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub binary: String,
    pub run_id: String,
    /// Number of simulated ranks the cells are split across.
    pub n_ranks: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            lattice: LatticeConfig {
                nx: 6,
                ny: 6,
                nz: 2,
                cell_size: 10.0,
                atoms_per_cell: 100,
                moment_per_atom: 2.2,
                m_dir: [0.0, 0.0, 1.0],
            },
            dipole: DipoleParams::default(),
            fields: FieldConfig {
                b_ext: [0.0, 0.0, 0.0],
            },
            run: RunInfo {
                binary: "dipole_lattice".to_string(),
                run_id: "default".to_string(),
                n_ranks: 1,
            },
        }
    }
}

impl RunConfig {
    pub fn write_to_dir(&self, out_dir: &Path) -> DipoleResult<()> {
        let path = out_dir.join("config.json");
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> DipoleResult<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}
