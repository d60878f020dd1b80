// Main library file for OMP2 calculations

pub mod error;
pub mod omp2_impl;
pub mod tensor;

pub use error::Omp2Error;
pub use omp2_impl::{ConvergenceStatus, Omp2, Omp2Params, Omp2Results};
pub use tensor::{AxisPair, OrbitalSpace, Tensor4};
