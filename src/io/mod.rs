//! Input/output operations for OMP2 runs
//!
//! This module handles `.npy` tensor loading and logging setup.

mod loader;
mod output;

pub use loader::{load_matrix, load_tensor4};
pub use output::setup_output;
