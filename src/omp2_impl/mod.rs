//! OMP2 (orbital-optimized Møller-Plesset perturbation theory, second order)
//!
//! This module computes the OMP2 ground-state energy. Unlike plain MP2,
//! which evaluates the correlation correction in a fixed set of mean-field
//! orbitals, OMP2 rotates the orbitals until the total energy is stationary
//! with respect to orbital rotation, re-deriving amplitudes and density
//! matrices in every rotated basis.
//!
//! # Theory
//!
//! Each iteration of the self-consistent loop performs, in order:
//!
//! 1. Fock build: f[p,q] = h[p,q] + Σ_{i∈occ} ⟨pi‖qi⟩, split into orbital
//!    energies (diagonal) and an off-diagonal remainder.
//! 2. Amplitude update:
//!    t[a,b,i,j] ← [⟨ab‖ij⟩ + P₋(ab) f'·t − P₋(ij) f'·t] / D[a,b,i,j]
//!    with D the orbital-energy denominator ε_i + ε_j − ε_a − ε_b.
//! 3. Density assembly: one- and two-particle reduced densities from t.
//! 4. Orbital rotation: the occupied–virtual block of the antisymmetric
//!    part of the generalized Fock matrix, scaled by inverse energy gaps,
//!    is exponentiated into an orthogonal rotation U = exp(X − Xᵗ) applied
//!    to the coefficients, C ← C·U.
//! 5. Integral re-transformation with the rotated coefficients and energy
//!    evaluation E = E_nuc + Σ h·γ + ¼ Σ ⟨pq‖rs⟩·Γ.
//!
//! The loop terminates when |ΔE| falls below the convergence threshold, or
//! reports [`ConvergenceStatus::MaxIterationsExceeded`] once the iteration
//! limit is reached.
//!
//! # Usage
//!
//! ```ignore
//! use omp2::{Omp2, Omp2Params};
//!
//! let mut solver = Omp2::new(h_ao, g_ao, c_ref, n_occ, e_nuc, Omp2Params::default())?;
//! let results = solver.solve()?;
//! println!("OMP2 total energy: {:.10} Eh", results.e_tot);
//! ```

mod amplitudes;
mod density;
mod driver;
mod fock;
mod rotation;
mod transform;

#[cfg(test)]
mod tests;

pub use amplitudes::update_amplitudes;
pub use density::{build_opdm, build_tpdm};
pub use driver::{
    evaluate_energy, reference_energy, ConvergenceStatus, Omp2, Omp2Params, Omp2Results,
};
pub use fock::{build_fock, split_fock};
pub use rotation::{
    build_generalized_fock, orbital_gradient, rotation_generator, rotation_operator,
};
pub use transform::{transform_one_electron, transform_two_electron};
