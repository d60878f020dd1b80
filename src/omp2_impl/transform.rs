//! Basis transformation of the one- and two-electron integrals
//!
//! Both transforms are pure functions of the raw (site-basis) integrals and
//! the current coefficient matrix; they are re-applied from the raw tensors
//! every iteration rather than rotating already-transformed quantities, so
//! no transformation error accumulates across iterations.

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::tensor::Tensor4;

/// One-electron congruence transform: hmo = Cᵗ h C.
pub fn transform_one_electron(h_ao: &DMatrix<f64>, mo_coeffs: &DMatrix<f64>) -> DMatrix<f64> {
    debug_assert_eq!(h_ao.nrows(), mo_coeffs.nrows());
    debug_assert_eq!(h_ao.ncols(), mo_coeffs.nrows());
    mo_coeffs.transpose() * h_ao * mo_coeffs
}

/// Two-electron congruence transform on all four legs, one leg at a time.
///
/// Each leg is an O(N⁵) contraction; the four-leg chain never materializes
/// anything larger than one N⁴ scratch tensor. Work is distributed over the
/// leading output index; every output element is reduced serially in a fixed
/// index order, so results do not depend on the thread count.
///
/// Antisymmetry of the input under exchange of either index pair carries
/// through to the output because all four legs apply the same coefficients.
pub fn transform_two_electron(g_ao: &Tensor4, mo_coeffs: &DMatrix<f64>) -> Tensor4 {
    let n = g_ao.shape()[0];
    debug_assert_eq!(g_ao.shape(), [n, n, n, n]);
    debug_assert_eq!((mo_coeffs.nrows(), mo_coeffs.ncols()), (n, n));

    let n2 = n * n;
    let n3 = n2 * n;

    // leg 1: scr[p,v,l,s] = sum_u C[u,p] g[u,v,l,s]
    let mut scr = Tensor4::zeros([n, n, n, n]);
    {
        let g = g_ao.as_slice();
        scr.as_mut_slice()
            .par_chunks_mut(n3)
            .enumerate()
            .for_each(|(p, out)| {
                for u in 0..n {
                    let c = mo_coeffs[(u, p)];
                    let src = &g[u * n3..(u + 1) * n3];
                    for (o, v) in out.iter_mut().zip(src) {
                        *o += c * *v;
                    }
                }
            });
    }

    // leg 2: scr2[p,q,l,s] = sum_v C[v,q] scr[p,v,l,s]
    let mut scr2 = Tensor4::zeros([n, n, n, n]);
    {
        let s1 = scr.as_slice();
        scr2.as_mut_slice()
            .par_chunks_mut(n3)
            .enumerate()
            .for_each(|(p, out)| {
                for q in 0..n {
                    let dst = &mut out[q * n2..(q + 1) * n2];
                    for v in 0..n {
                        let c = mo_coeffs[(v, q)];
                        let src = &s1[p * n3 + v * n2..p * n3 + (v + 1) * n2];
                        for (o, w) in dst.iter_mut().zip(src) {
                            *o += c * *w;
                        }
                    }
                }
            });
    }

    // leg 3: scr3[p,q,r,s] = sum_l C[l,r] scr2[p,q,l,s]
    let mut scr3 = Tensor4::zeros([n, n, n, n]);
    {
        let s2 = scr2.as_slice();
        scr3.as_mut_slice()
            .par_chunks_mut(n3)
            .enumerate()
            .for_each(|(p, out)| {
                for q in 0..n {
                    for r in 0..n {
                        let dst = &mut out[q * n2 + r * n..q * n2 + (r + 1) * n];
                        for l in 0..n {
                            let c = mo_coeffs[(l, r)];
                            let src = &s2[p * n3 + q * n2 + l * n..p * n3 + q * n2 + (l + 1) * n];
                            for (o, w) in dst.iter_mut().zip(src) {
                                *o += c * *w;
                            }
                        }
                    }
                }
            });
    }

    // leg 4: gmo[p,q,r,s] = sum_t C[t,s] scr3[p,q,r,t]
    let mut gmo = Tensor4::zeros([n, n, n, n]);
    {
        let s3 = scr3.as_slice();
        gmo.as_mut_slice()
            .par_chunks_mut(n3)
            .enumerate()
            .for_each(|(p, out)| {
                for q in 0..n {
                    for r in 0..n {
                        let src = &s3[p * n3 + q * n2 + r * n..p * n3 + q * n2 + (r + 1) * n];
                        for s in 0..n {
                            let mut acc = 0.0;
                            for (t, w) in src.iter().enumerate() {
                                acc += mo_coeffs[(t, s)] * *w;
                            }
                            out[q * n2 + r * n + s] = acc;
                        }
                    }
                }
            });
    }

    gmo
}
