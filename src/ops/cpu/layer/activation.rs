//! CPU implementation of ExactGeluOps

use crate::error::{Error, Result};
use crate::ops::traits::layer::ExactGeluOps;
use numr::dtype::DType;
use numr::runtime::cpu::{CpuClient, CpuRuntime};
use numr::tensor::Tensor;

#[inline]
fn gelu_erf_scalar(x: f64) -> f64 {
    0.5 * x * (1.0 + libm::erf(x * std::f64::consts::FRAC_1_SQRT_2))
}

impl ExactGeluOps<CpuRuntime> for CpuClient {
    fn gelu_erf(&self, x: &Tensor<CpuRuntime>) -> Result<Tensor<CpuRuntime>> {
        let x = x.contiguous();
        match x.dtype() {
            DType::F32 => {
                let out: Vec<f32> = x
                    .to_vec::<f32>()
                    .into_iter()
                    .map(|v| gelu_erf_scalar(v as f64) as f32)
                    .collect();
                Ok(Tensor::<CpuRuntime>::from_slice(&out, x.shape(), x.device()))
            }
            DType::F64 => {
                let out: Vec<f64> = x.to_vec::<f64>().into_iter().map(gelu_erf_scalar).collect();
                Ok(Tensor::<CpuRuntime>::from_slice(&out, x.shape(), x.device()))
            }
            other => Err(Error::InvalidArgument {
                arg: "x",
                reason: format!("gelu_erf expects F32 or F64, got {other:?}"),
            }),
        }
    }
}
