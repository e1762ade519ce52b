//! Generic activation compositions
//!
//! Composed from numr primitives, same on all backends.

use crate::error::{Error, Result};
use numr::ops::{ActivationOps, BinaryOps, ScalarOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// Leaky rectifier: `x` where `x >= 0`, `negative_slope * x` elsewhere.
///
/// Computed as `relu(x) + slope * (x - relu(x))`. The second term is exactly
/// zero for non-negative inputs and the first is exactly zero for negative
/// ones, so the result holds for any slope (not only `slope <= 1`).
pub fn leaky_relu_impl<R, C>(client: &C, x: &Tensor<R>, negative_slope: f64) -> Result<Tensor<R>>
where
    R: Runtime,
    C: RuntimeClient<R> + ActivationOps<R> + BinaryOps<R> + ScalarOps<R>,
{
    if !negative_slope.is_finite() {
        return Err(Error::InvalidArgument {
            arg: "negative_slope",
            reason: format!("must be finite, got {negative_slope}"),
        });
    }
    let positive = client.relu(x).map_err(Error::Numr)?;
    let negative = client.sub(x, &positive).map_err(Error::Numr)?;
    let scaled = client
        .mul_scalar(&negative, negative_slope)
        .map_err(Error::Numr)?;
    client.add(&positive, &scaled).map_err(Error::Numr)
}

/// Resolve a possibly negative axis against `ndim`.
pub fn normalize_axis(axis: isize, ndim: usize) -> Result<usize> {
    let rank = ndim as isize;
    let resolved = if axis < 0 { axis + rank } else { axis };
    if resolved < 0 || resolved >= rank {
        return Err(Error::InvalidArgument {
            arg: "axis",
            reason: format!("axis {axis} out of range for {ndim}D tensor"),
        });
    }
    Ok(resolved as usize)
}

/// Softmax along `axis` (negative axes count from the end).
pub fn softmax_impl<R, C>(client: &C, x: &Tensor<R>, axis: isize) -> Result<Tensor<R>>
where
    R: Runtime,
    C: RuntimeClient<R> + ActivationOps<R>,
{
    let dim = normalize_axis(axis, x.shape().len())? as isize;
    client.softmax(x, dim as _).map_err(Error::Numr)
}
