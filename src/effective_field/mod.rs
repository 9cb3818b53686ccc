// src/effective_field/mod.rs
//
// Effective induction B_eff (Tesla) per macrocell, as consumed by the time
// integrator. This crate contributes the external (Zeeman) and dipolar
// terms; exchange and anisotropy live in the atomistic solver.
pub mod dipole;
pub mod tensor;
pub mod zeeman;

use crate::cells::{CellArena, LocalCells};
use crate::error::DipoleResult;
use crate::vec3::add_assign;
use crate::vector_field::{CellField, DipoleFields};

use dipole::{DipoleFieldEvaluator, DipoleUpdate};
use tensor::InteractionTensorStore;

/// Add the dipolar induction (`fields.total`) into `b_eff` for populated local cells.
pub fn add_dipole_field(
    cells: &CellArena,
    local: &LocalCells,
    fields: &DipoleFields,
    b_eff: &mut CellField,
) {
    for &i in &local.local_to_global {
        if cells.is_populated(i) {
            add_assign(&mut b_eff.data[i], fields.total.data[i]);
        }
    }
}

/// Build B_eff for the local cells: zero, add Zeeman, refresh and add the dipole field.
///
/// If the dipole evaluator is disabled, whatever `fields` holds from the last
/// refresh is still added.
pub fn build_b_eff(
    cells: &CellArena,
    local: &LocalCells,
    tensor: &InteractionTensorStore,
    evaluator: &DipoleFieldEvaluator,
    fields: &mut DipoleFields,
    b_eff: &mut CellField,
    b_ext: [f64; 3],
) -> DipoleResult<DipoleUpdate> {
    let update = evaluator.evaluate(cells, local, tensor, fields)?;

    b_eff.resize(cells.n_cells());
    b_eff.set_uniform(0.0, 0.0, 0.0);
    zeeman::add_zeeman_field(cells, local, b_eff, b_ext);
    add_dipole_field(cells, local, fields, b_eff);

    Ok(update)
}
