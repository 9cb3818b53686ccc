// src/effective_field/dipole.rs
//
// Macrocell dipole-dipole (demagnetising) field.
//
// For each populated local cell i (global index), with m = moment / μ_B:
//
//   B_i      = C * [ (8π / 3V_i) m_i        + Σ_j T(i, j) · m_j ]
//   B_demag_i = C * [ -(1/2)(8π / 3V_i) m_i + Σ_j T(i, j) · m_j ]
//
// where j runs over all populated global cells in ascending order and
// C = μ_B μ0/(4π) · 1e30 (volumes are in Å^3). C is applied once per cell,
// after the sum.
//
// Notes:
// - The j-sum includes j = i whenever the store holds a self-pair tensor, on
//   top of the closed-form self term. This matches the reference simulator's
//   output and is kept as is.
// - Each cell's sum is sequential, so serial and Rayon evaluation give
//   bit-identical results.
// - Empty cells are never read into a sum and their outputs are not written.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::cells::{CellArena, LocalCells};
use crate::effective_field::tensor::{InteractionTensorStore, TensorRow};
use crate::error::{DipoleError, DipoleResult};
use crate::params::{DipoleParams, DIPOLE_FIELD_PREFACTOR, INV_MU_B, self_demag_factor};
use crate::vec3::{add_assign, scale};
use crate::vector_field::DipoleFields;

/// Outcome of one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DipoleUpdate {
    /// Evaluator disabled; outputs untouched.
    Skipped,
    /// Fields recomputed for `cells_updated` local cells; `cells_empty` local
    /// cells had no atoms and were left alone.
    Updated {
        cells_updated: usize,
        cells_empty: usize,
    },
}

/// Evaluates the dipole field for the cells owned by this process.
#[derive(Debug, Clone, Copy, Default)]
pub struct DipoleFieldEvaluator {
    pub params: DipoleParams,
}

impl DipoleFieldEvaluator {
    pub fn new(params: DipoleParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.params.enabled
    }

    /// Refresh `out.total` and `out.demag_only` for every populated local cell.
    ///
    /// Topology is checked before anything is written: on error, `out` is
    /// unchanged. The magnetisation of all global cells must already be
    /// current (the all-gather happens before this call).
    pub fn evaluate(
        &self,
        cells: &CellArena,
        local: &LocalCells,
        tensor: &InteractionTensorStore,
        out: &mut DipoleFields,
    ) -> DipoleResult<DipoleUpdate> {
        if !self.params.enabled {
            trace!(rank = self.params.rank, "dipole field disabled, skipping update");
            return Ok(DipoleUpdate::Skipped);
        }

        check_topology(cells, local, tensor, out)?;

        let n_local = local.n_local();
        debug!(
            rank = self.params.rank,
            n_local,
            n_global = cells.n_cells(),
            parallel = self.params.parallel,
            "dipole field update"
        );

        // Normalised moments for every global cell, computed once per refresh.
        let m_norm: Vec<[f64; 3]> = cells.mag.iter().map(|&m| scale(m, INV_MU_B)).collect();

        let compute = |lc: usize| {
            let i = local.global(lc);
            local_cell_fields(cells, &m_norm, tensor.row(lc), i).map(|f| (i, f))
        };

        let results: Vec<Option<(usize, ([f64; 3], [f64; 3]))>> = if self.params.parallel {
            (0..n_local).into_par_iter().map(compute).collect()
        } else {
            (0..n_local).map(compute).collect()
        };

        let mut cells_updated = 0;
        for (i, (total, demag_only)) in results.into_iter().flatten() {
            out.total.data[i] = total;
            out.demag_only.data[i] = demag_only;
            cells_updated += 1;
        }

        Ok(DipoleUpdate::Updated {
            cells_updated,
            cells_empty: n_local - cells_updated,
        })
    }
}

/// Validate that arena, local map, tensor store and outputs describe one topology.
pub fn check_topology(
    cells: &CellArena,
    local: &LocalCells,
    tensor: &InteractionTensorStore,
    out: &DipoleFields,
) -> DipoleResult<()> {
    cells.validate()?;
    let n_global = cells.n_cells();
    local.validate(n_global)?;
    tensor.check_shape(local.n_local(), n_global)?;

    for (name, len) in [("total", out.total.len()), ("demag_only", out.demag_only.len())] {
        if len != n_global {
            return Err(DipoleError::OutputSizeMismatch {
                name,
                got: len,
                expected: n_global,
            });
        }
    }
    Ok(())
}

/// (total, demag_only) for global cell `i`, or None if it holds no atoms.
fn local_cell_fields(
    cells: &CellArena,
    m_norm: &[[f64; 3]],
    row: TensorRow<'_>,
    i: usize,
) -> Option<([f64; 3], [f64; 3])> {
    if !cells.is_populated(i) {
        return None;
    }

    let self_demag = self_demag_factor(cells.volume[i]);
    let m_i = m_norm[i];

    let mut total = scale(m_i, self_demag);
    let mut demag_only = scale(m_i, -0.5 * self_demag);

    for (j, &m_j) in m_norm.iter().enumerate() {
        if !cells.is_populated(j) {
            continue;
        }
        let b = row.contract(j, m_j);
        add_assign(&mut total, b);
        add_assign(&mut demag_only, b);
    }

    Some((
        scale(total, DIPOLE_FIELD_PREFACTOR),
        scale(demag_only, DIPOLE_FIELD_PREFACTOR),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effective_field::tensor::SymTensor3;
    use crate::params::MU_B;

    fn two_cells() -> CellArena {
        CellArena::from_parts(
            vec![[MU_B, 0.0, 0.0], [0.0, 0.0, 2.0 * MU_B]],
            vec![100.0, 50.0],
            vec![8, 4],
        )
        .unwrap()
    }

    #[test]
    fn closed_form_self_term_without_coupling() {
        let cells = two_cells();
        let local = LocalCells::all(2);
        let tensor = InteractionTensorStore::zeros(2, 2);
        let mut out = DipoleFields::new(2);

        let r = DipoleFieldEvaluator::default()
            .evaluate(&cells, &local, &tensor, &mut out)
            .unwrap();
        assert_eq!(
            r,
            DipoleUpdate::Updated {
                cells_updated: 2,
                cells_empty: 0
            }
        );

        let s = self_demag_factor(50.0) * DIPOLE_FIELD_PREFACTOR;
        let mz = 2.0 * MU_B * INV_MU_B;
        assert!((out.total.data[1][2] - s * mz).abs() < 1e-12 * s);
        assert!((out.demag_only.data[1][2] + 0.5 * s * mz).abs() < 1e-12 * s);
        assert_eq!(out.total.data[1][0], 0.0);
    }

    #[test]
    fn self_pair_tensor_is_added_on_top_of_self_term() {
        let cells = two_cells();
        let local = LocalCells::new(vec![0]);
        let mut tensor = InteractionTensorStore::zeros(1, 2);
        tensor.set(0, 0, SymTensor3::diagonal(1.0));
        let mut out = DipoleFields::new(2);

        DipoleFieldEvaluator::default()
            .evaluate(&cells, &local, &tensor, &mut out)
            .unwrap();

        let mx = MU_B * INV_MU_B;
        let expected_total = (self_demag_factor(100.0) * mx + mx) * DIPOLE_FIELD_PREFACTOR;
        let expected_demag = (-0.5 * self_demag_factor(100.0) * mx + mx) * DIPOLE_FIELD_PREFACTOR;
        assert!((out.total.data[0][0] - expected_total).abs() < 1e-12);
        assert!((out.demag_only.data[0][0] - expected_demag).abs() < 1e-12);
        // cell 1 is not local: untouched
        assert_eq!(out.total.data[1], [0.0; 3]);
    }

    #[test]
    fn pair_term_is_common_to_both_outputs() {
        let cells = two_cells();
        let local = LocalCells::all(2);
        let tensor = InteractionTensorStore::from_fn(2, 2, |lc, j| {
            if lc == j {
                SymTensor3::ZERO
            } else {
                SymTensor3::new(-0.01, 0.002, 0.003, -0.01, 0.004, 0.02)
            }
        });
        let mut out = DipoleFields::new(2);
        DipoleFieldEvaluator::default()
            .evaluate(&cells, &local, &tensor, &mut out)
            .unwrap();

        for i in 0..2 {
            let s = self_demag_factor(cells.volume[i]) * DIPOLE_FIELD_PREFACTOR;
            let m = scale(cells.mag[i], INV_MU_B);
            for a in 0..3 {
                let diff = out.total.data[i][a] - out.demag_only.data[i][a];
                assert!(
                    (diff - 1.5 * s * m[a]).abs() < 1e-12,
                    "cell {} axis {}: diff={}",
                    i,
                    a,
                    diff
                );
            }
        }
    }

    #[test]
    fn disabled_evaluator_is_a_no_op() {
        let cells = two_cells();
        let local = LocalCells::all(2);
        let tensor = InteractionTensorStore::zeros(2, 2);
        let mut out = DipoleFields::new(2);
        out.total.set_uniform(1.0, 2.0, 3.0);
        let before = out.clone();

        let eval = DipoleFieldEvaluator::new(DipoleParams {
            enabled: false,
            ..DipoleParams::default()
        });
        assert_eq!(
            eval.evaluate(&cells, &local, &tensor, &mut out).unwrap(),
            DipoleUpdate::Skipped
        );
        assert_eq!(out, before);
    }

    #[test]
    fn bad_topology_writes_nothing() {
        let cells = two_cells();
        let local = LocalCells::all(2);
        let tensor = InteractionTensorStore::zeros(1, 2);
        let mut out = DipoleFields::new(2);
        out.demag_only.set_uniform(7.0, 7.0, 7.0);
        let before = out.clone();

        let r = DipoleFieldEvaluator::default().evaluate(&cells, &local, &tensor, &mut out);
        assert!(matches!(r, Err(DipoleError::TensorShapeMismatch { .. })));
        assert_eq!(out, before);

        let tensor = InteractionTensorStore::zeros(2, 2);
        let mut short = DipoleFields::new(1);
        let r = DipoleFieldEvaluator::default().evaluate(&cells, &local, &tensor, &mut short);
        assert!(matches!(
            r,
            Err(DipoleError::OutputSizeMismatch { name: "total", .. })
        ));
    }
}
