// src/cells.rs
//
// Macrocell arena and the local -> global index map.
//
// Every process holds the full set of M global cells (magnetisation kept in
// sync by an external all-gather before each field refresh) but only computes
// fields for the cells it owns. Ownership is an ordered list of global indices.

use crate::error::{DipoleError, DipoleResult};

/// All global cells. Index `j` in every array refers to global cell `j`.
#[derive(Debug, Clone, Default)]
pub struct CellArena {
    /// Total cell moment (J/T).
    pub mag: Vec<[f64; 3]>,
    /// Cell volume (Å^3).
    pub volume: Vec<f64>,
    /// Number of atoms in the cell. Empty cells are inert.
    pub num_atoms: Vec<u32>,
}

impl CellArena {
    /// Create an arena of `n` empty cells with zero moment and zero volume.
    pub fn new(n: usize) -> Self {
        Self {
            mag: vec![[0.0; 3]; n],
            volume: vec![0.0; n],
            num_atoms: vec![0; n],
        }
    }

    /// Build from existing arrays, checking that they describe one cell set.
    pub fn from_parts(
        mag: Vec<[f64; 3]>,
        volume: Vec<f64>,
        num_atoms: Vec<u32>,
    ) -> DipoleResult<Self> {
        let arena = Self {
            mag,
            volume,
            num_atoms,
        };
        arena.validate()?;
        Ok(arena)
    }

    /// Total number of global cells.
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.mag.len()
    }

    #[inline]
    pub fn is_populated(&self, j: usize) -> bool {
        self.num_atoms[j] > 0
    }

    /// Number of cells with at least one atom.
    pub fn n_populated(&self) -> usize {
        self.num_atoms.iter().filter(|&&n| n > 0).count()
    }

    /// Replace the whole magnetisation snapshot (after the all-gather).
    pub fn set_magnetization(&mut self, global: &[[f64; 3]]) -> DipoleResult<()> {
        if global.len() != self.n_cells() {
            return Err(DipoleError::SnapshotSizeMismatch {
                got: global.len(),
                expected: self.n_cells(),
            });
        }
        self.mag.copy_from_slice(global);
        Ok(())
    }

    /// Check array lengths agree and that every populated cell has a usable volume.
    pub fn validate(&self) -> DipoleResult<()> {
        let n = self.mag.len();
        if self.volume.len() != n || self.num_atoms.len() != n {
            return Err(DipoleError::ShapeMismatch {
                mag: n,
                volume: self.volume.len(),
                num_atoms: self.num_atoms.len(),
            });
        }
        for (cell, (&v, &na)) in self.volume.iter().zip(&self.num_atoms).enumerate() {
            if na > 0 && !(v.is_finite() && v > 0.0) {
                return Err(DipoleError::NonPositiveVolume { cell, volume: v });
            }
        }
        Ok(())
    }
}

/// Cells owned by this process, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalCells {
    pub local_to_global: Vec<usize>,
}

impl LocalCells {
    pub fn new(local_to_global: Vec<usize>) -> Self {
        Self { local_to_global }
    }

    /// A single process owning all `n` cells.
    pub fn all(n: usize) -> Self {
        Self::new((0..n).collect())
    }

    #[inline]
    pub fn n_local(&self) -> usize {
        self.local_to_global.len()
    }

    /// Global index of local cell `lc`.
    #[inline]
    pub fn global(&self, lc: usize) -> usize {
        self.local_to_global[lc]
    }

    /// Every local index must name a distinct, existing global cell.
    pub fn validate(&self, n_global: usize) -> DipoleResult<()> {
        let mut seen = vec![false; n_global];
        for (local, &global) in self.local_to_global.iter().enumerate() {
            if global >= n_global {
                return Err(DipoleError::LocalIndexOutOfRange {
                    local,
                    global,
                    n_global,
                });
            }
            if seen[global] {
                return Err(DipoleError::DuplicateLocalCell { global });
            }
            seen[global] = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_rejects_mismatched_arrays() {
        let r = CellArena::from_parts(vec![[0.0; 3]; 3], vec![1.0; 2], vec![1; 3]);
        assert!(matches!(r, Err(DipoleError::ShapeMismatch { .. })));
    }

    #[test]
    fn empty_cells_may_have_zero_volume() {
        let arena = CellArena::from_parts(
            vec![[0.0; 3]; 3],
            vec![10.0, 0.0, 5.0],
            vec![4, 0, 2],
        )
        .unwrap();
        assert_eq!(arena.n_populated(), 2);
        assert!(!arena.is_populated(1));
    }

    #[test]
    fn populated_cell_with_zero_volume_is_rejected() {
        let r = CellArena::from_parts(vec![[0.0; 3]; 2], vec![10.0, 0.0], vec![1, 1]);
        match r {
            Err(DipoleError::NonPositiveVolume { cell, .. }) => assert_eq!(cell, 1),
            other => panic!("expected NonPositiveVolume, got {:?}", other),
        }
    }

    #[test]
    fn snapshot_length_is_checked() {
        let mut arena = CellArena::new(4);
        assert!(arena.set_magnetization(&[[1.0, 0.0, 0.0]; 3]).is_err());
        arena.set_magnetization(&[[1.0, 0.0, 0.0]; 4]).unwrap();
        assert_eq!(arena.mag[3], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn local_map_validation() {
        assert!(LocalCells::new(vec![2, 0]).validate(3).is_ok());
        assert!(matches!(
            LocalCells::new(vec![0, 3]).validate(3),
            Err(DipoleError::LocalIndexOutOfRange { local: 1, global: 3, .. })
        ));
        assert!(matches!(
            LocalCells::new(vec![1, 1]).validate(3),
            Err(DipoleError::DuplicateLocalCell { global: 1 })
        ));
        assert_eq!(LocalCells::all(3).global(2), 2);
    }
}
