// src/effective_field/zeeman.rs

use crate::cells::{CellArena, LocalCells};
use crate::vector_field::CellField;

/// Add a uniform external induction B_ext (Tesla) to every populated local cell.
pub fn add_zeeman_field(
    cells: &CellArena,
    local: &LocalCells,
    b_eff: &mut CellField,
    b_ext: [f64; 3],
) {
    for &i in &local.local_to_global {
        if cells.is_populated(i) {
            crate::vec3::add_assign(&mut b_eff.data[i], b_ext);
        }
    }
}
