//! NumPy `.npy` tensor loading
//!
//! Input tensors are little-endian f64 arrays in C order, as written by
//! `numpy.save`. Shapes are validated here; consistency between the tensors
//! is the solver's entry check.

use color_eyre::eyre::{eyre, Result, WrapErr};
use nalgebra::DMatrix;
use omp2::Tensor4;
use std::fs;

fn read_npy(path: &str) -> Result<(Vec<usize>, Vec<f64>)> {
    let bytes = fs::read(path).wrap_err_with(|| format!("Unable to read tensor file: {path}"))?;
    let npy = npyz::NpyFile::new(&bytes[..])
        .wrap_err_with(|| format!("Not a valid .npy file: {path}"))?;
    let shape = npy.shape().iter().map(|&x| x as usize).collect::<Vec<usize>>();
    let data = npy
        .into_vec::<f64>()
        .wrap_err_with(|| format!("Expected an f64 array in {path}"))?;
    Ok((shape, data))
}

/// Load a rank-2 tensor into a matrix.
pub fn load_matrix(path: &str) -> Result<DMatrix<f64>> {
    let (shape, data) = read_npy(path)?;
    if shape.len() != 2 {
        return Err(eyre!(
            "{path}: expected a rank-2 array, found shape {shape:?}"
        ));
    }
    // .npy data is row-major
    Ok(DMatrix::from_row_iterator(shape[0], shape[1], data))
}

/// Load a rank-4 tensor.
pub fn load_tensor4(path: &str) -> Result<Tensor4> {
    let (shape, data) = read_npy(path)?;
    if shape.len() != 4 {
        return Err(eyre!(
            "{path}: expected a rank-4 array, found shape {shape:?}"
        ));
    }
    Ok(Tensor4::from_vec([shape[0], shape[1], shape[2], shape[3]], data))
}
