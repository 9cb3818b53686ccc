// src/error.rs
//
// Configuration errors for the dipole solver. All of these are programming or
// setup defects: nothing here is retried, and no output is written once one
// is detected.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DipoleError {
    #[error("cell arena arrays disagree: mag={mag}, volume={volume}, num_atoms={num_atoms}")]
    ShapeMismatch {
        mag: usize,
        volume: usize,
        num_atoms: usize,
    },

    #[error("magnetisation snapshot has {got} cells, arena has {expected}")]
    SnapshotSizeMismatch { got: usize, expected: usize },

    #[error("local cell {local} maps to global cell {global}, but only {n_global} cells exist")]
    LocalIndexOutOfRange {
        local: usize,
        global: usize,
        n_global: usize,
    },

    #[error("global cell {global} appears more than once in the local cell map")]
    DuplicateLocalCell { global: usize },

    #[error("populated cell {cell} has non-positive or non-finite volume {volume}")]
    NonPositiveVolume { cell: usize, volume: f64 },

    #[error("interaction tensor is {got_local}x{got_global}, expected {n_local}x{n_global}")]
    TensorShapeMismatch {
        got_local: usize,
        got_global: usize,
        n_local: usize,
        n_global: usize,
    },

    #[error("tensor component {component} has {got} entries, expected {expected}")]
    TensorComponentLength {
        component: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("output buffer {name} has {got} cells, expected {expected}")]
    OutputSizeMismatch {
        name: &'static str,
        got: usize,
        expected: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type DipoleResult<T> = Result<T, DipoleError>;
