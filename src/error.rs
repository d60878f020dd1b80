//! Error types for the OMP2 solver

use std::fmt;

/// Error type returned by [`crate::Omp2`].
///
/// Contract violations are detected once at entry; numerical failures carry
/// the iteration number and the offending orbital indices so a bad input
/// system can be diagnosed from the error alone. Reaching the iteration
/// limit is not an error; see
/// [`crate::ConvergenceStatus::MaxIterationsExceeded`].
#[derive(Debug, Clone, PartialEq)]
pub enum Omp2Error {
    /// The input tensors do not agree on the spin-orbital dimension N.
    /// Each field records the shape of the corresponding input.
    DimensionMismatch {
        h_shape: (usize, usize),
        g_shape: [usize; 4],
        c_shape: (usize, usize),
    },
    /// The spin-orbital dimension is odd; a spin-blocked basis always has
    /// an even number of spin orbitals.
    OddOrbitalCount { n_orb: usize },
    /// `n_occ` is zero or does not leave at least one virtual orbital.
    InvalidOccupation { n_occ: usize, n_orb: usize },
    /// The two-electron tensor is not antisymmetric under exchange of its
    /// first or last index pair. Records the first offending element.
    NonAntisymmetricIntegrals {
        indices: [usize; 4],
        deviation: f64,
    },
    /// The initial coefficient matrix does not satisfy CᵗC = I.
    NonOrthonormalOrbitals { deviation: f64 },
    /// An orbital-energy denominator fell below the configured threshold
    /// while updating amplitudes or building the rotation generator.
    /// `orbitals` lists the spin orbitals entering the denominator.
    DegenerateDenominator {
        iteration: usize,
        orbitals: Vec<usize>,
        value: f64,
    },
    /// The matrix exponential of the rotation generator produced a
    /// non-finite entry.
    MatrixExponentialFailed { iteration: usize },
}

impl fmt::Display for Omp2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Omp2Error::DimensionMismatch { h_shape, g_shape, c_shape } => write!(
                f,
                "input tensors disagree on the spin-orbital dimension: \
                 h is {}x{}, g is {}x{}x{}x{}, c is {}x{}",
                h_shape.0,
                h_shape.1,
                g_shape[0],
                g_shape[1],
                g_shape[2],
                g_shape[3],
                c_shape.0,
                c_shape.1
            ),
            Omp2Error::OddOrbitalCount { n_orb } => {
                write!(f, "spin-orbital dimension {n_orb} is odd")
            }
            Omp2Error::InvalidOccupation { n_occ, n_orb } => write!(
                f,
                "occupied count {n_occ} must satisfy 0 < n_occ < {n_orb}"
            ),
            Omp2Error::NonAntisymmetricIntegrals { indices, deviation } => write!(
                f,
                "two-electron tensor is not antisymmetric at [{}, {}, {}, {}] \
                 (deviation {deviation:.3e})",
                indices[0], indices[1], indices[2], indices[3]
            ),
            Omp2Error::NonOrthonormalOrbitals { deviation } => write!(
                f,
                "initial orbital coefficients are not orthonormal \
                 (max |CtC - I| = {deviation:.3e})"
            ),
            Omp2Error::DegenerateDenominator { iteration, orbitals, value } => write!(
                f,
                "degenerate orbital energies in iteration {iteration}: \
                 denominator {value:.3e} for orbitals {orbitals:?}"
            ),
            Omp2Error::MatrixExponentialFailed { iteration } => write!(
                f,
                "matrix exponential of the rotation generator failed in \
                 iteration {iteration}"
            ),
        }
    }
}

impl std::error::Error for Omp2Error {}
