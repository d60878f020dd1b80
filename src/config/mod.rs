//! Configuration management for OMP2 runs
//!
//! This module handles the YAML run-configuration structures, defaults, and
//! the mapping onto the library's solver parameters.

mod args;

pub use args::Args;

use omp2::Omp2Params;
use serde::{Deserialize, Serialize};

/// Main configuration structure for an OMP2 run.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub system: SystemInput,
    pub omp2: Option<SolverParams>,
}

/// The externally prepared reference data: spin-orbital dimensions, the
/// nuclear repulsion constant and the `.npy` tensor files.
#[derive(Debug, Deserialize, Serialize)]
pub struct SystemInput {
    /// Number of occupied spin orbitals.
    pub n_occ: usize,
    /// Nuclear/core repulsion energy in Hartree.
    pub e_nuc: f64,
    /// One-electron integrals, shape (N, N).
    pub h_file: String,
    /// Antisymmetrized two-electron integrals, shape (N, N, N, N).
    pub g_file: String,
    /// Initial orbital coefficients, shape (N, N), columns sorted by
    /// ascending reference orbital energy.
    pub c_file: String,
}

/// Solver parameters; any omitted field falls back to its default.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SolverParams {
    pub max_iterations: Option<usize>,
    pub convergence_threshold: Option<f64>,
    pub denominator_threshold: Option<f64>,
}

impl Default for SolverParams {
    fn default() -> Self {
        let defaults = Omp2Params::default();
        SolverParams {
            max_iterations: Some(defaults.max_iterations),
            convergence_threshold: Some(defaults.convergence_threshold),
            denominator_threshold: Some(defaults.denominator_threshold),
        }
    }
}

impl SolverParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.max_iterations.is_none() {
            self.max_iterations = defaults.max_iterations;
        }
        if self.convergence_threshold.is_none() {
            self.convergence_threshold = defaults.convergence_threshold;
        }
        if self.denominator_threshold.is_none() {
            self.denominator_threshold = defaults.denominator_threshold;
        }
        self
    }
}

impl Config {
    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        let solver = self.omp2.take().unwrap_or_default();
        self.omp2 = Some(solver.with_defaults());
        self
    }

    /// Solver parameters as the library expects them, after defaults.
    pub fn solver_params(&self) -> Omp2Params {
        let defaults = Omp2Params::default();
        let solver = self.omp2.clone().unwrap_or_default();
        Omp2Params {
            max_iterations: solver.max_iterations.unwrap_or(defaults.max_iterations),
            convergence_threshold: solver
                .convergence_threshold
                .unwrap_or(defaults.convergence_threshold),
            denominator_threshold: solver
                .denominator_threshold
                .unwrap_or(defaults.denominator_threshold),
        }
    }
}
