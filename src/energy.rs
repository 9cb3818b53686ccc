// src/energy.rs
//
// Dipolar energy diagnostics for the local cells:
//   E = -1/2 Σ_i μ_i · B_i   (J, with μ in J/T and B in T)
// The 1/2 avoids double counting pair energies. Only local populated cells
// contribute, so summing over all ranks gives the global energy.

use crate::cells::{CellArena, LocalCells};
use crate::vec3::dot;
use crate::vector_field::{CellField, DipoleFields};

fn half_contraction(cells: &CellArena, local: &LocalCells, b: &CellField) -> f64 {
    let mut sum = 0.0;
    for &i in &local.local_to_global {
        if cells.is_populated(i) {
            sum += dot(cells.mag[i], b.data[i]);
        }
    }
    -0.5 * sum
}

/// Energy of the local cells in the full dipolar field (`total`).
pub fn dipole_energy(cells: &CellArena, local: &LocalCells, fields: &DipoleFields) -> f64 {
    half_contraction(cells, local, &fields.total)
}

/// Same contraction against the diagnostic `demag_only` field.
pub fn demag_energy(cells: &CellArena, local: &LocalCells, fields: &DipoleFields) -> f64 {
    half_contraction(cells, local, &fields.demag_only)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_skips_empty_and_foreign_cells() {
        let cells = CellArena::from_parts(
            vec![[1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
            vec![1.0, 1.0, 1.0],
            vec![1, 0, 1],
        )
        .unwrap();
        let local = LocalCells::new(vec![0, 1]);
        let mut fields = DipoleFields::new(3);
        fields.total.set_uniform(4.0, 1.0, 0.0);
        fields.demag_only.set_uniform(-2.0, 0.0, 0.0);

        assert_eq!(dipole_energy(&cells, &local, &fields), -2.0);
        assert_eq!(demag_energy(&cells, &local, &fields), 1.0);
    }
}
