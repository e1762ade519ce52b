//! Activation kernels not covered by numr's `ActivationOps`
//!
//! numr's `gelu` is the tanh approximation.

use crate::error::Result;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Exact (erf-based) GELU.
///
/// `gelu(x) = 0.5 · x · (1 + erf(x / √2))`
pub trait ExactGeluOps<R: Runtime> {
    /// Elementwise exact GELU, shape-preserving.
    fn gelu_erf(&self, x: &Tensor<R>) -> Result<Tensor<R>>;
}
