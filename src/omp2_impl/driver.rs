//! Orbital-optimization convergence driver
//!
//! Owns all mutable state of the optimization (the coefficient matrix and
//! the amplitude tensor); every other quantity is rebuilt from scratch each
//! iteration by the stateless component functions in this module's
//! siblings.

use nalgebra::DMatrix;
use tracing::info;

use crate::error::Omp2Error;
use crate::omp2_impl::amplitudes::update_amplitudes;
use crate::omp2_impl::density::{build_opdm, build_tpdm};
use crate::omp2_impl::fock::{build_fock, split_fock};
use crate::omp2_impl::rotation::{
    build_generalized_fock, orbital_gradient, rotation_generator, rotation_operator,
};
use crate::omp2_impl::transform::{transform_one_electron, transform_two_electron};
use crate::tensor::{OrbitalSpace, Tensor4};

/// Entry-validation tolerance for |g[p,q,r,s] + g[q,p,r,s]| and the
/// back-pair analogue.
const ANTISYMMETRY_TOL: f64 = 1.0e-10;

/// Entry-validation tolerance for max |CᵗC − I|.
const ORTHONORMALITY_TOL: f64 = 1.0e-8;

/// Solver parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Omp2Params {
    /// Maximum number of orbital-optimization iterations.
    pub max_iterations: usize,
    /// Convergence threshold on |ΔE| between successive iterations.
    pub convergence_threshold: f64,
    /// Fatal-error threshold for orbital-energy denominators.
    pub denominator_threshold: f64,
}

impl Default for Omp2Params {
    fn default() -> Self {
        Omp2Params {
            max_iterations: 40,
            convergence_threshold: 1.0e-8,
            denominator_threshold: 1.0e-10,
        }
    }
}

/// Terminal outcome of a completed run. Running out of iterations is a
/// reported outcome, not an error: the best-available energy and orbitals
/// are still returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    Converged,
    MaxIterationsExceeded,
}

/// Results of an OMP2 run.
#[derive(Debug, Clone)]
pub struct Omp2Results {
    /// Total energy at the last completed iteration.
    pub e_tot: f64,
    /// Correlation part of `e_tot` relative to the reference determinant in
    /// the final orbital basis.
    pub e_corr: f64,
    /// Final (rotated) coefficient matrix.
    pub mo_coeffs: DMatrix<f64>,
    /// Number of iterations actually performed.
    pub iterations: usize,
    pub status: ConvergenceStatus,
}

/// Orbital-optimized MP2 solver.
///
/// Constructed from the externally supplied reference data: the one- and
/// two-electron integrals in the fixed spin-orbital site basis, the initial
/// coefficient matrix (columns sorted by ascending reference orbital
/// energy), the occupied count and the nuclear repulsion constant.
/// [`Omp2::new`] validates the input contract; [`Omp2::solve`] runs the
/// optimization.
pub struct Omp2 {
    pub space: OrbitalSpace,
    /// One-electron integrals in the untransformed site basis.
    pub h_ao: DMatrix<f64>,
    /// Antisymmetrized two-electron integrals in the untransformed site
    /// basis.
    pub g_ao: Tensor4,
    /// Current orbital coefficients; rotated in place every iteration.
    pub mo_coeffs: DMatrix<f64>,
    /// Nuclear/core repulsion constant.
    pub e_nuc: f64,
    /// Amplitude tensor, shape (n_virt, n_virt, n_occ, n_occ); the only
    /// tensor besides the coefficients that survives across iterations.
    pub t_amp: Tensor4,
    pub params: Omp2Params,
    /// Total energy of the last completed run.
    pub energy: Option<f64>,
}

impl Omp2 {
    /// Validate the input contract and set up the solver state.
    pub fn new(
        h_ao: DMatrix<f64>,
        g_ao: Tensor4,
        mo_coeffs: DMatrix<f64>,
        n_occ: usize,
        e_nuc: f64,
        params: Omp2Params,
    ) -> Result<Self, Omp2Error> {
        let n = h_ao.nrows();
        let h_shape = (h_ao.nrows(), h_ao.ncols());
        let g_shape = g_ao.shape();
        let c_shape = (mo_coeffs.nrows(), mo_coeffs.ncols());
        if h_shape != (n, n) || g_shape != [n, n, n, n] || c_shape != (n, n) {
            return Err(Omp2Error::DimensionMismatch { h_shape, g_shape, c_shape });
        }
        if n % 2 != 0 {
            return Err(Omp2Error::OddOrbitalCount { n_orb: n });
        }
        if n_occ == 0 || n_occ >= n {
            return Err(Omp2Error::InvalidOccupation { n_occ, n_orb: n });
        }

        for p in 0..n {
            for q in 0..n {
                for r in 0..n {
                    for s in 0..n {
                        let v = g_ao.get(p, q, r, s);
                        let front = v + g_ao.get(q, p, r, s);
                        if front.abs() > ANTISYMMETRY_TOL {
                            return Err(Omp2Error::NonAntisymmetricIntegrals {
                                indices: [p, q, r, s],
                                deviation: front.abs(),
                            });
                        }
                        let back = v + g_ao.get(p, q, s, r);
                        if back.abs() > ANTISYMMETRY_TOL {
                            return Err(Omp2Error::NonAntisymmetricIntegrals {
                                indices: [p, q, r, s],
                                deviation: back.abs(),
                            });
                        }
                    }
                }
            }
        }

        let gram = mo_coeffs.transpose() * &mo_coeffs;
        let identity = DMatrix::identity(n, n);
        let deviation = (gram - identity)
            .iter()
            .fold(0.0_f64, |m, v| m.max(v.abs()));
        if deviation > ORTHONORMALITY_TOL {
            return Err(Omp2Error::NonOrthonormalOrbitals { deviation });
        }

        let space = OrbitalSpace::new(n, n_occ);
        let t_amp = Tensor4::zeros([space.n_virt(), space.n_virt(), n_occ, n_occ]);

        info!("OMP2 setup:");
        info!("  Spin orbitals:     {}", n);
        info!("  Occupied orbitals: {}", n_occ);
        info!("  Virtual orbitals:  {}", space.n_virt());
        info!("  Nuclear repulsion: {:.10} Eh", e_nuc);

        Ok(Omp2 {
            space,
            h_ao,
            g_ao,
            mo_coeffs,
            e_nuc,
            t_amp,
            params,
            energy: None,
        })
    }

    /// Run the orbital-optimization loop to energy convergence.
    ///
    /// Each iteration: Fock build and split, amplitude update, density
    /// assembly, orbital gradient and rotation, re-transformation of the
    /// integrals with the rotated coefficients, energy evaluation,
    /// convergence test on |ΔE|.
    pub fn solve(&mut self) -> Result<Omp2Results, Omp2Error> {
        let space = self.space;
        let max_iterations = self.params.max_iterations;
        let conv_tol = self.params.convergence_threshold;
        let denom_tol = self.params.denominator_threshold;

        let mut hmo = transform_one_electron(&self.h_ao, &self.mo_coeffs);
        let mut gmo = transform_two_electron(&self.g_ao, &self.mo_coeffs);

        let mut e_prev = 0.0;
        let mut e_last = 0.0;

        info!("{:>5} {:>20} {:>16}", "Iter", "E_total (Eh)", "dE (Eh)");

        for iteration in 1..=max_iterations {
            let fock = build_fock(&hmo, &gmo, space);
            let (eps, fprime) = split_fock(&fock);

            self.t_amp = update_amplitudes(
                &fprime, &gmo, &eps, &self.t_amp, space, denom_tol, iteration,
            )?;

            let (opdm_corr, opdm) = build_opdm(&self.t_amp, space);
            let tpdm = build_tpdm(&self.t_amp, &opdm_corr, space);

            if iteration == 1 {
                // With mean-field reference orbitals the first energy, taken
                // before any rotation, is the plain MP2 total energy.
                let e_mp2 = evaluate_energy(&hmo, &gmo, &opdm, &tpdm, self.e_nuc);
                info!("Energy at reference orbitals (MP2): {:.12} Eh", e_mp2);
            }

            let f_gen = build_generalized_fock(&hmo, &gmo, &opdm, &tpdm);
            let grad = orbital_gradient(&f_gen, space);
            let x = rotation_generator(&grad, &eps, space, denom_tol, iteration)?;
            let u = rotation_operator(&x, iteration)?;

            self.mo_coeffs = &self.mo_coeffs * u;
            hmo = transform_one_electron(&self.h_ao, &self.mo_coeffs);
            gmo = transform_two_electron(&self.g_ao, &self.mo_coeffs);

            let e_tot = evaluate_energy(&hmo, &gmo, &opdm, &tpdm, self.e_nuc);
            let delta = e_tot - e_prev;
            e_last = e_tot;

            info!("{:5} {:20.12} {:16.4e}", iteration, e_tot, delta);

            if delta.abs() < conv_tol {
                info!("OMP2 converged in {} iterations.", iteration);
                info!("Final OMP2 total energy: {:.12} Eh", e_tot);
                self.energy = Some(e_tot);
                let e_ref = reference_energy(&hmo, &gmo, space, self.e_nuc);
                return Ok(Omp2Results {
                    e_tot,
                    e_corr: e_tot - e_ref,
                    mo_coeffs: self.mo_coeffs.clone(),
                    iterations: iteration,
                    status: ConvergenceStatus::Converged,
                });
            }
            e_prev = e_tot;
        }

        info!(
            "OMP2 did not converge within {} iterations; returning the last energy.",
            max_iterations
        );
        self.energy = Some(e_last);
        let e_ref = reference_energy(&hmo, &gmo, space, self.e_nuc);
        Ok(Omp2Results {
            e_tot: e_last,
            e_corr: e_last - e_ref,
            mo_coeffs: self.mo_coeffs.clone(),
            iterations: max_iterations,
            status: ConvergenceStatus::MaxIterationsExceeded,
        })
    }
}

/// Total energy functional:
/// E = E_nuc + Σ_{p,q} hmo[p,q] opdm[q,p] + ¼ Σ_{p,q,r,s} gmo[p,q,r,s] tpdm[r,s,p,q]
pub fn evaluate_energy(
    hmo: &DMatrix<f64>,
    gmo: &Tensor4,
    opdm: &DMatrix<f64>,
    tpdm: &Tensor4,
    e_nuc: f64,
) -> f64 {
    let n = hmo.nrows();
    let e_one = (hmo * opdm).trace();
    let mut e_two = 0.0;
    for p in 0..n {
        for q in 0..n {
            for r in 0..n {
                for s in 0..n {
                    e_two += gmo.get(p, q, r, s) * tpdm.get(r, s, p, q);
                }
            }
        }
    }
    e_nuc + e_one + 0.25 * e_two
}

/// Energy of the reference determinant in the current orbital basis.
pub fn reference_energy(
    hmo: &DMatrix<f64>,
    gmo: &Tensor4,
    space: OrbitalSpace,
    e_nuc: f64,
) -> f64 {
    let mut e = e_nuc;
    for i in space.occ() {
        e += hmo[(i, i)];
    }
    for i in space.occ() {
        for j in space.occ() {
            e += 0.5 * gmo.get(i, j, i, j);
        }
    }
    e
}
