//! Tests for the OMP2 implementation

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};

    use super::super::*;
    use crate::error::Omp2Error;
    use crate::tensor::{OrbitalSpace, Tensor4};

    /// Diagonally dominant symmetric one-electron matrix with an ascending
    /// diagonal, so the first orbitals are the energetically lowest.
    fn synthetic_one_electron(n: usize) -> DMatrix<f64> {
        let mut h = DMatrix::zeros(n, n);
        for p in 0..n {
            h[(p, p)] = -2.0 + 0.5 * p as f64;
            for q in (p + 1)..n {
                let v = 0.01 / (1.0 + (q - p) as f64);
                h[(p, q)] = v;
                h[(q, p)] = v;
            }
        }
        h
    }

    /// Deterministic smooth four-index coupling used to seed the
    /// two-electron tensor.
    fn coupling(p: usize, q: usize, r: usize, s: usize) -> f64 {
        let x = (p as f64 + 1.3) * (q as f64 + 2.7) + (r as f64 + 0.9) * (s as f64 + 1.1);
        0.05 * x.sin()
    }

    /// Antisymmetrized two-electron tensor with the full symmetry of a real
    /// integral set: an eightfold-symmetric chemist-ordered tensor is built
    /// first, reordered to physicist convention, then antisymmetrized.
    fn synthetic_two_electron(n: usize) -> Tensor4 {
        let mut chem = Tensor4::zeros([n, n, n, n]);
        for p in 0..n {
            for q in 0..n {
                for r in 0..n {
                    for s in 0..n {
                        let avg = (coupling(p, q, r, s)
                            + coupling(q, p, r, s)
                            + coupling(p, q, s, r)
                            + coupling(q, p, s, r)
                            + coupling(r, s, p, q)
                            + coupling(s, r, p, q)
                            + coupling(r, s, q, p)
                            + coupling(s, r, q, p))
                            / 8.0;
                        chem.set(p, q, r, s, avg);
                    }
                }
            }
        }

        let mut g = Tensor4::zeros([n, n, n, n]);
        for p in 0..n {
            for q in 0..n {
                for r in 0..n {
                    for s in 0..n {
                        g.set(p, q, r, s, chem.get(p, r, q, s) - chem.get(p, s, q, r));
                    }
                }
            }
        }
        g
    }

    fn max_antisymmetry_violation(g: &Tensor4) -> f64 {
        let n = g.shape()[0];
        let mut worst = 0.0_f64;
        for p in 0..n {
            for q in 0..n {
                for r in 0..n {
                    for s in 0..n {
                        let v = g.get(p, q, r, s);
                        worst = worst.max((v + g.get(q, p, r, s)).abs());
                        worst = worst.max((v + g.get(p, q, s, r)).abs());
                    }
                }
            }
        }
        worst
    }

    /// Orthogonal coefficient matrix mixing a few orbital pairs.
    fn rotated_coefficients(n: usize) -> DMatrix<f64> {
        let mut c = DMatrix::identity(n, n);
        let (cos_a, sin_a) = (0.3_f64.cos(), 0.3_f64.sin());
        c[(0, 0)] = cos_a;
        c[(0, 1)] = -sin_a;
        c[(1, 0)] = sin_a;
        c[(1, 1)] = cos_a;
        let (cos_b, sin_b) = (0.7_f64.cos(), 0.7_f64.sin());
        c[(2, 2)] = cos_b;
        c[(2, n - 1)] = -sin_b;
        c[(n - 1, 2)] = sin_b;
        c[(n - 1, n - 1)] = cos_b;
        c
    }

    #[test]
    fn test_transform_with_identity_is_identity() {
        let n = 4;
        let h = synthetic_one_electron(n);
        let g = synthetic_two_electron(n);
        let c = DMatrix::identity(n, n);

        let hmo = transform_one_electron(&h, &c);
        let gmo = transform_two_electron(&g, &c);

        assert_relative_eq!(hmo, h, epsilon = 1e-14);
        for (a, b) in gmo.as_slice().iter().zip(g.as_slice()) {
            assert_relative_eq!(a, b, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_transform_preserves_antisymmetry() {
        let n = 6;
        let g = synthetic_two_electron(n);
        assert!(max_antisymmetry_violation(&g) < 1e-14);

        let c = rotated_coefficients(n);
        let gmo = transform_two_electron(&g, &c);
        assert!(max_antisymmetry_violation(&gmo) < 1e-12);
    }

    #[test]
    fn test_fock_split() {
        let n = 4;
        let h = synthetic_one_electron(n);
        let g = synthetic_two_electron(n);
        let space = OrbitalSpace::new(n, 2);

        let fock = build_fock(&h, &g, space);
        let (eps, fprime) = split_fock(&fock);

        for p in 0..n {
            assert_eq!(eps[p], fock[(p, p)]);
            assert_eq!(fprime[(p, p)], 0.0);
            for q in 0..n {
                if p != q {
                    assert_eq!(fprime[(p, q)], fock[(p, q)]);
                }
            }
        }

        // screening term picks up occupied columns only
        let mut expected = h[(1, 3)];
        for i in space.occ() {
            expected += g.get(1, i, 3, i);
        }
        assert_relative_eq!(fock[(1, 3)], expected, epsilon = 1e-14);
    }

    fn amplitude_antisymmetry_violation(t: &Tensor4) -> f64 {
        let [nv, _, no, _] = t.shape();
        let mut worst = 0.0_f64;
        for a in 0..nv {
            for b in 0..nv {
                for i in 0..no {
                    for j in 0..no {
                        let v = t.get(a, b, i, j);
                        worst = worst.max((v + t.get(b, a, i, j)).abs());
                        worst = worst.max((v + t.get(a, b, j, i)).abs());
                    }
                }
            }
        }
        worst
    }

    #[test]
    fn test_amplitudes_stay_antisymmetric() {
        let n = 8;
        let space = OrbitalSpace::new(n, 4);
        let h = synthetic_one_electron(n);
        let g = synthetic_two_electron(n);

        let fock = build_fock(&h, &g, space);
        let (eps, fprime) = split_fock(&fock);
        let t0 = Tensor4::zeros([4, 4, 4, 4]);

        let t1 = update_amplitudes(&fprime, &g, &eps, &t0, space, 1e-10, 1).unwrap();
        assert!(amplitude_antisymmetry_violation(&t1) < 1e-12);

        // second update feeds the nonzero previous amplitudes through the
        // off-diagonal Fock terms
        let t2 = update_amplitudes(&fprime, &g, &eps, &t1, space, 1e-10, 2).unwrap();
        assert!(amplitude_antisymmetry_violation(&t2) < 1e-12);
        assert!(t2.max_abs() > 0.0);
    }

    #[test]
    fn test_degenerate_amplitude_denominator_is_fatal() {
        let n = 4;
        let space = OrbitalSpace::new(n, 2);
        // occupied orbital above a virtual one: eps_i + eps_j crosses
        // eps_a + eps_b exactly
        let eps = DVector::from_vec(vec![0.0, 1.0, 0.5, 0.5]);
        let fprime = DMatrix::zeros(n, n);
        let gmo = Tensor4::zeros([n, n, n, n]);
        let t0 = Tensor4::zeros([2, 2, 2, 2]);

        let err = update_amplitudes(&fprime, &gmo, &eps, &t0, space, 1e-10, 3).unwrap_err();
        match err {
            Omp2Error::DegenerateDenominator { iteration, value, .. } => {
                assert_eq!(iteration, 3);
                assert!(value.abs() < 1e-10);
            }
            other => panic!("expected DegenerateDenominator, got {other:?}"),
        }
    }

    #[test]
    fn test_degenerate_rotation_gap_is_fatal() {
        let n = 4;
        let space = OrbitalSpace::new(n, 2);
        let eps = DVector::from_vec(vec![-1.0, 1.0, 1.0, 2.0]);
        let grad = DMatrix::from_element(2, 2, 0.1);

        let err = rotation_generator(&grad, &eps, space, 1e-10, 5).unwrap_err();
        match err {
            Omp2Error::DegenerateDenominator { iteration, orbitals, .. } => {
                assert_eq!(iteration, 5);
                assert_eq!(orbitals, vec![1, 2]);
            }
            other => panic!("expected DegenerateDenominator, got {other:?}"),
        }
    }

    #[test]
    fn test_rotation_operator_is_orthogonal() {
        let n = 6;
        let space = OrbitalSpace::new(n, 2);
        let eps = DVector::from_vec(vec![-2.0, -1.5, 0.5, 1.0, 1.5, 2.0]);
        let mut grad = DMatrix::zeros(4, 2);
        for a in 0..4 {
            for i in 0..2 {
                grad[(a, i)] = 0.2 * ((a + 1) as f64) - 0.1 * (i as f64);
            }
        }

        let x = rotation_generator(&grad, &eps, space, 1e-10, 1).unwrap();
        let u = rotation_operator(&x, 1).unwrap();

        let residual = u.transpose() * &u - DMatrix::identity(n, n);
        let worst = residual.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(worst < 1e-12, "U is not orthogonal: {worst:.3e}");
    }

    #[test]
    fn test_zero_generator_gives_identity_rotation() {
        let n = 4;
        let x = DMatrix::zeros(n, n);
        let u = rotation_operator(&x, 1).unwrap();
        assert_relative_eq!(u, DMatrix::identity(n, n), epsilon = 1e-14);
    }

    #[test]
    fn test_zero_gradient_is_a_noop() {
        // with diagonal h and no two-electron coupling the reference
        // orbitals are already stationary
        let n = 6;
        let n_occ = 2;
        let mut h = DMatrix::zeros(n, n);
        for p in 0..n {
            h[(p, p)] = -1.0 + 0.5 * p as f64;
        }
        let g = Tensor4::zeros([n, n, n, n]);
        let c = DMatrix::identity(n, n);

        let mut solver = Omp2::new(h.clone(), g, c.clone(), n_occ, 0.5, Omp2Params::default())
            .unwrap();
        let results = solver.solve().unwrap();

        assert_eq!(results.status, ConvergenceStatus::Converged);
        assert_eq!(results.iterations, 2);
        assert_relative_eq!(results.mo_coeffs, c, epsilon = 1e-12);

        let expected = 0.5 + h[(0, 0)] + h[(1, 1)];
        assert_relative_eq!(results.e_tot, expected, epsilon = 1e-12);
        assert_relative_eq!(results.e_corr, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_first_iteration_energy_identity() {
        // With amplitudes t = g/D taken directly from the first update, the
        // energy functional collapses to
        //   E_ref + ¼ Σ g·t + Σ f'·γ_corr
        // which this test rebuilds from the pieces independently.
        let n = 6;
        let n_occ = 2;
        let space = OrbitalSpace::new(n, n_occ);
        let h = synthetic_one_electron(n);
        let g = synthetic_two_electron(n);
        let e_nuc = 1.25;

        let fock = build_fock(&h, &g, space);
        let (eps, fprime) = split_fock(&fock);
        let t0 = Tensor4::zeros([space.n_virt(), space.n_virt(), n_occ, n_occ]);
        let t1 = update_amplitudes(&fprime, &g, &eps, &t0, space, 1e-10, 1).unwrap();

        let (opdm_corr, opdm) = build_opdm(&t1, space);
        let tpdm = build_tpdm(&t1, &opdm_corr, space);

        let e = evaluate_energy(&h, &g, &opdm, &tpdm, e_nuc);

        let mut expected = reference_energy(&h, &g, space, e_nuc);
        for a in 0..space.n_virt() {
            for b in 0..space.n_virt() {
                for i in 0..n_occ {
                    for j in 0..n_occ {
                        expected +=
                            0.25 * g.get(n_occ + a, n_occ + b, i, j) * t1.get(a, b, i, j);
                    }
                }
            }
        }
        for p in 0..n {
            for q in 0..n {
                expected += fprime[(p, q)] * opdm_corr[(q, p)];
            }
        }

        assert_relative_eq!(e, expected, epsilon = 1e-10);
    }

    #[test]
    fn test_opdm_trace_counts_electrons() {
        let n = 8;
        let space = OrbitalSpace::new(n, 4);
        let h = synthetic_one_electron(n);
        let g = synthetic_two_electron(n);

        let fock = build_fock(&h, &g, space);
        let (eps, fprime) = split_fock(&fock);
        let t0 = Tensor4::zeros([4, 4, 4, 4]);
        let t1 = update_amplitudes(&fprime, &g, &eps, &t0, space, 1e-10, 1).unwrap();

        let (_, opdm) = build_opdm(&t1, space);
        assert_relative_eq!(opdm.trace(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tpdm_is_antisymmetric() {
        let n = 6;
        let space = OrbitalSpace::new(n, 2);
        let h = synthetic_one_electron(n);
        let g = synthetic_two_electron(n);

        let fock = build_fock(&h, &g, space);
        let (eps, fprime) = split_fock(&fock);
        let t0 = Tensor4::zeros([4, 4, 2, 2]);
        let t1 = update_amplitudes(&fprime, &g, &eps, &t0, space, 1e-10, 1).unwrap();

        let (opdm_corr, _) = build_opdm(&t1, space);
        let tpdm = build_tpdm(&t1, &opdm_corr, space);
        assert!(max_antisymmetry_violation(&tpdm) < 1e-12);
    }

    #[test]
    fn test_boundary_occupations_complete() {
        let n = 8;
        let h = synthetic_one_electron(n);
        let g = synthetic_two_electron(n);
        let c = DMatrix::identity(n, n);
        let params = Omp2Params { max_iterations: 60, ..Omp2Params::default() };

        for n_occ in [2, n - 2] {
            let mut solver =
                Omp2::new(h.clone(), g.clone(), c.clone(), n_occ, 0.0, params).unwrap();
            let results = solver.solve().unwrap();
            assert_eq!(
                results.status,
                ConvergenceStatus::Converged,
                "n_occ = {n_occ} did not converge"
            );
            assert!(results.e_tot.is_finite());
        }
    }

    #[test]
    fn test_entry_validation() {
        let n = 6;
        let h = synthetic_one_electron(n);
        let g = synthetic_two_electron(n);
        let c = DMatrix::identity(n, n);
        let params = Omp2Params::default();

        // mismatched coefficient matrix
        let bad_c = DMatrix::identity(n + 2, n + 2);
        assert!(matches!(
            Omp2::new(h.clone(), g.clone(), bad_c, 2, 0.0, params),
            Err(Omp2Error::DimensionMismatch { .. })
        ));

        // odd orbital count
        let n_odd = 5;
        let h_odd = synthetic_one_electron(n_odd);
        let g_odd = synthetic_two_electron(n_odd);
        let c_odd = DMatrix::identity(n_odd, n_odd);
        assert!(matches!(
            Omp2::new(h_odd, g_odd, c_odd, 2, 0.0, params),
            Err(Omp2Error::OddOrbitalCount { n_orb: 5 })
        ));

        // occupied count out of range
        assert!(matches!(
            Omp2::new(h.clone(), g.clone(), c.clone(), 0, 0.0, params),
            Err(Omp2Error::InvalidOccupation { .. })
        ));
        assert!(matches!(
            Omp2::new(h.clone(), g.clone(), c.clone(), n, 0.0, params),
            Err(Omp2Error::InvalidOccupation { .. })
        ));

        // broken antisymmetry
        let mut bad_g = g.clone();
        bad_g.set(0, 1, 2, 3, bad_g.get(0, 1, 2, 3) + 1e-3);
        assert!(matches!(
            Omp2::new(h.clone(), bad_g, c.clone(), 2, 0.0, params),
            Err(Omp2Error::NonAntisymmetricIntegrals { .. })
        ));

        // non-orthonormal coefficients
        let scaled_c = DMatrix::identity(n, n) * 1.1;
        assert!(matches!(
            Omp2::new(h, g, scaled_c, 2, 0.0, params),
            Err(Omp2Error::NonOrthonormalOrbitals { .. })
        ));
    }
}
