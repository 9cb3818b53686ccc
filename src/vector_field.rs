// src/vector_field.rs

use tracing::info;

/// One 3-vector per global cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellField {
    pub data: Vec<[f64; 3]>,
}

impl CellField {
    /// Create a zero field for `n` cells.
    pub fn new(n: usize) -> Self {
        Self {
            data: vec![[0.0; 3]; n],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Set all cells to the same vector (x, y, z).
    pub fn set_uniform(&mut self, x: f64, y: f64, z: f64) {
        for cell in &mut self.data {
            *cell = [x, y, z];
        }
    }

    /// Resize to `n` cells. New cells start at zero, existing ones are kept.
    pub fn resize(&mut self, n: usize) {
        self.data.resize(n, [0.0; 3]);
    }
}

/// The two outputs of a dipole field refresh, indexed by global cell.
///
/// `total` drives the dynamics; `demag_only` is a diagnostic that carries
/// -1/2 of the self term instead of +1. Both are overwritten for every
/// populated local cell on each refresh and left alone elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct DipoleFields {
    pub total: CellField,
    pub demag_only: CellField,
}

impl DipoleFields {
    /// Allocate zeroed buffers for `n_cells` global cells.
    pub fn new(n_cells: usize) -> Self {
        Self {
            total: CellField::new(n_cells),
            demag_only: CellField::new(n_cells),
        }
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.total.len()
    }

    /// Follow a topology change.
    pub fn resize(&mut self, n_cells: usize) {
        if n_cells != self.n_cells() {
            info!(
                from = self.n_cells(),
                to = n_cells,
                "resizing dipole field buffers"
            );
        }
        self.total.resize(n_cells);
        self.demag_only.resize(n_cells);
    }
}
