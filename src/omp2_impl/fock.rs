//! Fock operator in the current orbital basis

use nalgebra::{DMatrix, DVector};

use crate::tensor::{OrbitalSpace, Tensor4};

/// Effective one-body operator: f[p,q] = hmo[p,q] + Σ_{i∈occ} gmo[p,i,q,i].
///
/// The two-electron screening sums over occupied orbitals only.
pub fn build_fock(hmo: &DMatrix<f64>, gmo: &Tensor4, space: OrbitalSpace) -> DMatrix<f64> {
    let n = space.n_orb;
    let mut fock = hmo.clone();
    for p in 0..n {
        for q in 0..n {
            let mut acc = 0.0;
            for i in space.occ() {
                acc += gmo.get(p, i, q, i);
            }
            fock[(p, q)] += acc;
        }
    }
    fock
}

/// Split the Fock matrix into its diagonal (the orbital energies) and the
/// off-diagonal remainder used by the amplitude update.
pub fn split_fock(fock: &DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
    let eps = fock.diagonal();
    let mut fprime = fock.clone();
    fprime.fill_diagonal(0.0);
    (eps, fprime)
}
