//! Orbital gradient and the Newton–Raphson rotation step

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::error::Omp2Error;
use crate::tensor::{OrbitalSpace, Tensor4};

/// Generalized Fock matrix built from the full one- and two-particle
/// densities:
///
/// F[p,q] = Σ_r hmo[p,r] opdm[r,q] + ½ Σ_{r,s,t} gmo[p,r,s,t] tpdm[s,t,q,r]
///
/// The two-body contraction is distributed over the row index; each element
/// is reduced serially in a fixed index order.
pub fn build_generalized_fock(
    hmo: &DMatrix<f64>,
    gmo: &Tensor4,
    opdm: &DMatrix<f64>,
    tpdm: &Tensor4,
) -> DMatrix<f64> {
    let n = hmo.nrows();
    let mut f_gen = hmo * opdm;

    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|p| {
            let mut row = vec![0.0; n];
            for q in 0..n {
                let mut acc = 0.0;
                for r in 0..n {
                    for s in 0..n {
                        for t in 0..n {
                            acc += gmo.get(p, r, s, t) * tpdm.get(s, t, q, r);
                        }
                    }
                }
                row[q] = 0.5 * acc;
            }
            row
        })
        .collect();

    for (p, row) in rows.iter().enumerate() {
        for (q, v) in row.iter().enumerate() {
            f_gen[(p, q)] += v;
        }
    }

    f_gen
}

/// Virtual-row/occupied-column block of the antisymmetric part of the
/// generalized Fock matrix. Zero at an orbital-optimization stationary
/// point.
pub fn orbital_gradient(f_gen: &DMatrix<f64>, space: OrbitalSpace) -> DMatrix<f64> {
    let no = space.n_occ;
    let nv = space.n_virt();
    let mut grad = DMatrix::zeros(nv, no);
    for a in 0..nv {
        for i in 0..no {
            grad[(a, i)] = f_gen[(no + a, i)] - f_gen[(i, no + a)];
        }
    }
    grad
}

/// Scale the gradient by inverse orbital-energy gaps to form the rotation
/// generator. Only the virtual–occupied block is populated; rotations
/// inside either block leave the energy invariant and are excluded to keep
/// the generator unique.
pub fn rotation_generator(
    grad: &DMatrix<f64>,
    eps: &DVector<f64>,
    space: OrbitalSpace,
    denominator_threshold: f64,
    iteration: usize,
) -> Result<DMatrix<f64>, Omp2Error> {
    let n = space.n_orb;
    let no = space.n_occ;
    let nv = space.n_virt();

    let mut x = DMatrix::zeros(n, n);
    for a in 0..nv {
        for i in 0..no {
            let gap = eps[i] - eps[no + a];
            if gap.abs() < denominator_threshold {
                return Err(Omp2Error::DegenerateDenominator {
                    iteration,
                    orbitals: vec![i, no + a],
                    value: gap,
                });
            }
            x[(no + a, i)] = grad[(a, i)] / gap;
        }
    }
    Ok(x)
}

/// Exponentiate the antisymmetrized generator into an orthogonal rotation:
/// U = exp(X − Xᵗ). Antisymmetry of the exponent is what guarantees UᵗU = I,
/// which in turn keeps the rotated coefficient matrix orthonormal.
pub fn rotation_operator(x: &DMatrix<f64>, iteration: usize) -> Result<DMatrix<f64>, Omp2Error> {
    let generator = x - x.transpose();
    let u = generator.exp();
    if u.iter().any(|v| !v.is_finite()) {
        return Err(Omp2Error::MatrixExponentialFailed { iteration });
    }
    Ok(u)
}
