//! One- and two-particle reduced density matrices
//!
//! Both densities split into a fixed reference part (the occupied-block
//! identity and its antisymmetrized pair product) and a correlation part
//! carried by the amplitudes. The correlation blocks live in the same
//! unified spin-orbital index space as everything else; occupied/virtual
//! placement follows the [`OrbitalSpace`] ranges.

use nalgebra::DMatrix;

use crate::tensor::{OrbitalSpace, Tensor4};

/// Build the one-particle density. Returns `(opdm_corr, opdm)` where the
/// second adds the reference occupied-block identity to the first; the
/// correlation part is needed separately by the two-particle assembly.
///
/// Correlation blocks:
///   virtual–virtual  [b,a]:  ½ Σ_{c,i,j} t[a,c,i,j] t[b,c,i,j]
///   occupied–occupied [j,i]: −½ Σ_{k,a,b} t[a,b,j,k] t[a,b,i,k]
pub fn build_opdm(t_amp: &Tensor4, space: OrbitalSpace) -> (DMatrix<f64>, DMatrix<f64>) {
    let n = space.n_orb;
    let no = space.n_occ;
    let nv = space.n_virt();

    let mut opdm_corr = DMatrix::zeros(n, n);

    for a in 0..nv {
        for b in 0..nv {
            let mut acc = 0.0;
            for c in 0..nv {
                for i in 0..no {
                    for j in 0..no {
                        acc += t_amp.get(a, c, i, j) * t_amp.get(b, c, i, j);
                    }
                }
            }
            opdm_corr[(no + b, no + a)] = 0.5 * acc;
        }
    }

    for i in 0..no {
        for j in 0..no {
            let mut acc = 0.0;
            for k in 0..no {
                for a in 0..nv {
                    for b in 0..nv {
                        acc += t_amp.get(a, b, j, k) * t_amp.get(a, b, i, k);
                    }
                }
            }
            opdm_corr[(j, i)] = -0.5 * acc;
        }
    }

    let mut opdm = opdm_corr.clone();
    for i in space.occ() {
        opdm[(i, i)] += 1.0;
    }

    (opdm_corr, opdm)
}

/// Build the two-particle density from the amplitudes and the correlation
/// one-particle density.
///
/// The amplitude tensor fills the virtual-virtual/occupied-occupied block
/// and its four-leg transpose fills the mirrored block. The remaining terms
/// are antisymmetrized outer products: every (bra, ket) pairing of
/// opdm_corr with the reference density enters with alternating sign under
/// exchange of the two bra or two ket indices, and likewise for the
/// reference-with-reference product.
pub fn build_tpdm(t_amp: &Tensor4, opdm_corr: &DMatrix<f64>, space: OrbitalSpace) -> Tensor4 {
    let n = space.n_orb;
    let no = space.n_occ;
    let nv = space.n_virt();

    let mut tpdm = Tensor4::zeros([n, n, n, n]);

    for a in 0..nv {
        for b in 0..nv {
            for i in 0..no {
                for j in 0..no {
                    let v = t_amp.get(a, b, i, j);
                    tpdm.set(no + a, no + b, i, j, v);
                    tpdm.set(i, j, no + a, no + b, v);
                }
            }
        }
    }

    // opdm_corr ⊗ opdm_ref: the reference factor reduces to a delta on an
    // occupied index, leaving four sign permutations of the same element.
    for k in space.occ() {
        for r in 0..n {
            for p in 0..n {
                let v = opdm_corr[(r, p)];
                tpdm[[r, k, p, k]] += v;
                tpdm[[k, r, p, k]] -= v;
                tpdm[[r, k, k, p]] -= v;
                tpdm[[k, r, k, p]] += v;
            }
        }
    }

    // opdm_ref ⊗ opdm_ref: two sign permutations over occupied pairs.
    for i in space.occ() {
        for j in space.occ() {
            tpdm[[i, j, i, j]] += 1.0;
            tpdm[[i, j, j, i]] -= 1.0;
        }
    }

    tpdm
}
