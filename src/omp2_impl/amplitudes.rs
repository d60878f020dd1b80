//! Particle-hole amplitude update
//!
//! One linear fixed-point step per outer iteration: the amplitude tensor is
//! refreshed once from the previous iterate, not solved to self-consistency,
//! because the orbital rotation that follows invalidates the integrals the
//! amplitudes are built from anyway.

use nalgebra::{DMatrix, DVector};

use crate::error::Omp2Error;
use crate::tensor::{AxisPair, OrbitalSpace, Tensor4};

/// Compute the updated amplitude tensor
///
/// t_new[a,b,i,j] = [ gmo[a,b,i,j]
///                    + P₋(ab) Σ_c fprime[a,c] t_prev[c,b,i,j]
///                    - P₋(ij) Σ_k fprime[k,i] t_prev[a,b,k,j] ]
///                  / (eps[i] + eps[j] - eps[a] - eps[b])
///
/// where P₋ is the permute-and-subtract antisymmetrizer. The result is
/// antisymmetric under exchange of either index pair by construction.
///
/// A denominator whose magnitude falls below `denominator_threshold` means
/// the occupied and virtual orbital energies have crossed or collided; this
/// returns [`Omp2Error::DegenerateDenominator`] instead of dividing.
pub fn update_amplitudes(
    fprime: &DMatrix<f64>,
    gmo: &Tensor4,
    eps: &DVector<f64>,
    t_prev: &Tensor4,
    space: OrbitalSpace,
    denominator_threshold: f64,
    iteration: usize,
) -> Result<Tensor4, Omp2Error> {
    let no = space.n_occ;
    let nv = space.n_virt();

    // Σ_c fprime[a,c] t_prev[c,b,i,j] over the virtual block
    let mut term_vv = Tensor4::zeros([nv, nv, no, no]);
    for a in 0..nv {
        for b in 0..nv {
            for i in 0..no {
                for j in 0..no {
                    let mut acc = 0.0;
                    for c in 0..nv {
                        acc += fprime[(no + a, no + c)] * t_prev.get(c, b, i, j);
                    }
                    term_vv.set(a, b, i, j, acc);
                }
            }
        }
    }
    let term_vv = term_vv.antisymmetrize(AxisPair::Front);

    // Σ_k fprime[k,i] t_prev[a,b,k,j] over the occupied block
    let mut term_oo = Tensor4::zeros([nv, nv, no, no]);
    for a in 0..nv {
        for b in 0..nv {
            for i in 0..no {
                for j in 0..no {
                    let mut acc = 0.0;
                    for k in 0..no {
                        acc += fprime[(k, i)] * t_prev.get(a, b, k, j);
                    }
                    term_oo.set(a, b, i, j, acc);
                }
            }
        }
    }
    let term_oo = term_oo.antisymmetrize(AxisPair::Back);

    let mut t_new = Tensor4::zeros([nv, nv, no, no]);
    for a in 0..nv {
        for b in 0..nv {
            for i in 0..no {
                for j in 0..no {
                    let denom = eps[i] + eps[j] - eps[no + a] - eps[no + b];
                    if denom.abs() < denominator_threshold {
                        return Err(Omp2Error::DegenerateDenominator {
                            iteration,
                            orbitals: vec![i, j, no + a, no + b],
                            value: denom,
                        });
                    }
                    let num = gmo.get(no + a, no + b, i, j) + term_vv.get(a, b, i, j)
                        - term_oo.get(a, b, i, j);
                    t_new.set(a, b, i, j, num / denom);
                }
            }
        }
    }

    Ok(t_new)
}
