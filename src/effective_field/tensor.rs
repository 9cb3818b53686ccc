// src/effective_field/tensor.rs
//
// Interaction tensor store for the macrocell dipole field.
//
// For every (local cell lc, global cell j) pair we hold the six independent
// components of a symmetric 3x3 coupling tensor, in units of Å^-3, so that
//   B_i ∝ Σ_j T(lc, j) · (m_j / μ_B).
//
// Storage is six flat row-major arrays of shape [n_local][n_global]. Only
// local x global pairs are materialised, so T(lc, j) and T(j', i') on another
// process need not coincide in memory even though the physical block is
// symmetric.
//
// Building the tensor from geometry is done elsewhere; `from_fn` is the
// adapter a geometry provider plugs into.

use crate::error::{DipoleError, DipoleResult};

/// Symmetric 3x3 tensor stored by its six independent components.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SymTensor3 {
    pub xx: f64,
    pub xy: f64,
    pub xz: f64,
    pub yy: f64,
    pub yz: f64,
    pub zz: f64,
}

impl SymTensor3 {
    pub const ZERO: Self = Self {
        xx: 0.0,
        xy: 0.0,
        xz: 0.0,
        yy: 0.0,
        yz: 0.0,
        zz: 0.0,
    };

    pub fn new(xx: f64, xy: f64, xz: f64, yy: f64, yz: f64, zz: f64) -> Self {
        Self {
            xx,
            xy,
            xz,
            yy,
            yz,
            zz,
        }
    }

    /// Isotropic tensor s * I.
    pub fn diagonal(s: f64) -> Self {
        Self::new(s, 0.0, 0.0, s, 0.0, s)
    }

    /// T · m.
    #[inline]
    pub fn contract(&self, m: [f64; 3]) -> [f64; 3] {
        [
            m[0] * self.xx + m[1] * self.xy + m[2] * self.xz,
            m[0] * self.xy + m[1] * self.yy + m[2] * self.yz,
            m[0] * self.xz + m[1] * self.yz + m[2] * self.zz,
        ]
    }

    /// Full 3x3 matrix view.
    pub fn full(&self) -> [[f64; 3]; 3] {
        [
            [self.xx, self.xy, self.xz],
            [self.xy, self.yy, self.yz],
            [self.xz, self.yz, self.zz],
        ]
    }

    pub fn trace(&self) -> f64 {
        self.xx + self.yy + self.zz
    }
}

/// Borrowed view of one local cell's row in each of the six arrays.
#[derive(Debug, Clone, Copy)]
pub struct TensorRow<'a> {
    pub xx: &'a [f64],
    pub xy: &'a [f64],
    pub xz: &'a [f64],
    pub yy: &'a [f64],
    pub yz: &'a [f64],
    pub zz: &'a [f64],
}

impl TensorRow<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        self.xx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xx.is_empty()
    }

    /// Field contribution of global cell `j` with normalised moment `m`.
    #[inline]
    pub fn contract(&self, j: usize, m: [f64; 3]) -> [f64; 3] {
        [
            m[0] * self.xx[j] + m[1] * self.xy[j] + m[2] * self.xz[j],
            m[0] * self.xy[j] + m[1] * self.yy[j] + m[2] * self.yz[j],
            m[0] * self.xz[j] + m[1] * self.yz[j] + m[2] * self.zz[j],
        ]
    }
}

/// Read-only (during evaluation) store of local x global coupling tensors.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionTensorStore {
    n_local: usize,
    n_global: usize,
    xx: Vec<f64>,
    xy: Vec<f64>,
    xz: Vec<f64>,
    yy: Vec<f64>,
    yz: Vec<f64>,
    zz: Vec<f64>,
}

const COMPONENT_NAMES: [&str; 6] = ["xx", "xy", "xz", "yy", "yz", "zz"];

impl InteractionTensorStore {
    /// All-zero store: no pair coupling, only the self term acts.
    pub fn zeros(n_local: usize, n_global: usize) -> Self {
        let n = n_local * n_global;
        Self {
            n_local,
            n_global,
            xx: vec![0.0; n],
            xy: vec![0.0; n],
            xz: vec![0.0; n],
            yy: vec![0.0; n],
            yz: vec![0.0; n],
            zz: vec![0.0; n],
        }
    }

    /// Wrap six row-major arrays in (xx, xy, xz, yy, yz, zz) order.
    pub fn from_components(
        n_local: usize,
        n_global: usize,
        components: [Vec<f64>; 6],
    ) -> DipoleResult<Self> {
        let expected = n_local * n_global;
        for (name, c) in COMPONENT_NAMES.iter().zip(components.iter()) {
            if c.len() != expected {
                return Err(DipoleError::TensorComponentLength {
                    component: *name,
                    got: c.len(),
                    expected,
                });
            }
        }
        let [xx, xy, xz, yy, yz, zz] = components;
        Ok(Self {
            n_local,
            n_global,
            xx,
            xy,
            xz,
            yy,
            yz,
            zz,
        })
    }

    /// Fill every (lc, j) entry from a geometry callback.
    pub fn from_fn<F>(n_local: usize, n_global: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> SymTensor3,
    {
        let mut store = Self::zeros(n_local, n_global);
        for lc in 0..n_local {
            for j in 0..n_global {
                store.set(lc, j, f(lc, j));
            }
        }
        store
    }

    /// (n_local, n_global).
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_local, self.n_global)
    }

    #[inline]
    fn idx(&self, lc: usize, j: usize) -> usize {
        debug_assert!(lc < self.n_local && j < self.n_global);
        lc * self.n_global + j
    }

    pub fn get(&self, lc: usize, j: usize) -> SymTensor3 {
        let k = self.idx(lc, j);
        SymTensor3 {
            xx: self.xx[k],
            xy: self.xy[k],
            xz: self.xz[k],
            yy: self.yy[k],
            yz: self.yz[k],
            zz: self.zz[k],
        }
    }

    pub fn set(&mut self, lc: usize, j: usize, t: SymTensor3) {
        let k = self.idx(lc, j);
        self.xx[k] = t.xx;
        self.xy[k] = t.xy;
        self.xz[k] = t.xz;
        self.yy[k] = t.yy;
        self.yz[k] = t.yz;
        self.zz[k] = t.zz;
    }

    /// Row `lc` of all six arrays, for the inner summation loop.
    pub fn row(&self, lc: usize) -> TensorRow<'_> {
        let r = lc * self.n_global..(lc + 1) * self.n_global;
        TensorRow {
            xx: &self.xx[r.clone()],
            xy: &self.xy[r.clone()],
            xz: &self.xz[r.clone()],
            yy: &self.yy[r.clone()],
            yz: &self.yz[r.clone()],
            zz: &self.zz[r],
        }
    }

    /// Check the store was built for this topology.
    pub fn check_shape(&self, n_local: usize, n_global: usize) -> DipoleResult<()> {
        if self.shape() != (n_local, n_global) {
            return Err(DipoleError::TensorShapeMismatch {
                got_local: self.n_local,
                got_global: self.n_global,
                n_local,
                n_global,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_uses_symmetric_block() {
        let t = SymTensor3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        let full = t.full();
        let m = [0.5, -1.0, 2.0];
        let got = t.contract(m);
        for a in 0..3 {
            let expected = full[a][0] * m[0] + full[a][1] * m[1] + full[a][2] * m[2];
            assert_eq!(got[a], expected);
        }
        for a in 0..3 {
            for b in 0..3 {
                assert_eq!(full[a][b], full[b][a]);
            }
        }
    }

    #[test]
    fn from_fn_roundtrips_through_get_and_row() {
        let store = InteractionTensorStore::from_fn(2, 3, |lc, j| {
            SymTensor3::diagonal((10 * lc + j) as f64)
        });
        assert_eq!(store.shape(), (2, 3));
        assert_eq!(store.get(1, 2).xx, 12.0);

        let row = store.row(1);
        assert_eq!(row.len(), 3);
        assert_eq!(row.contract(0, [1.0, 1.0, 1.0]), [10.0, 10.0, 10.0]);
    }

    #[test]
    fn component_lengths_are_checked() {
        let good = vec![0.0; 6];
        let bad = vec![0.0; 5];
        let r = InteractionTensorStore::from_components(
            2,
            3,
            [good.clone(), good.clone(), good.clone(), bad, good.clone(), good],
        );
        match r {
            Err(DipoleError::TensorComponentLength { component, got, .. }) => {
                assert_eq!(component, "yy");
                assert_eq!(got, 5);
            }
            other => panic!("expected TensorComponentLength, got {:?}", other),
        }
    }

    #[test]
    fn shape_check() {
        let store = InteractionTensorStore::zeros(2, 5);
        assert!(store.check_shape(2, 5).is_ok());
        assert!(store.check_shape(5, 2).is_err());
    }
}
