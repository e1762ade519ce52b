//! Weight initialization strategies

use crate::error::Result;
use crate::rng::GeneratorState;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Initialization strategy for new parameter tensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Init {
    /// All zeros (consumes no randomness)
    Zeros,
    /// Uniform random in `[-bound, bound)`
    Uniform(f32),
}

impl Init {
    /// `U(-s, s)` with `s = sqrt(1 / fan_in)`.
    pub fn fan_in_uniform(fan_in: usize) -> Self {
        Init::Uniform((1.0 / fan_in as f64).sqrt() as f32)
    }

    /// Build an F32 tensor of `shape`, drawing from `state` if the strategy is random.
    pub fn build<R: Runtime>(
        &self,
        state: &mut GeneratorState,
        shape: &[usize],
        device: &R::Device,
    ) -> Result<Tensor<R>> {
        match *self {
            Init::Zeros => {
                let n: usize = shape.iter().product();
                Ok(Tensor::<R>::from_slice(&vec![0.0f32; n], shape, device))
            }
            Init::Uniform(bound) => state.uniform(-bound, bound, shape, device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::cpu_setup;
    use numr::runtime::cpu::CpuRuntime;

    #[test]
    fn test_zeros_leaves_stream_untouched() {
        let (_client, device) = cpu_setup();
        let mut a = GeneratorState::new(9);
        let mut b = GeneratorState::new(9);
        let z: Tensor<CpuRuntime> = Init::Zeros.build(&mut a, &[3], &device).unwrap();
        assert_eq!(z.to_vec::<f32>(), vec![0.0; 3]);
        assert_eq!(a.normal_values(&[4]), b.normal_values(&[4]));
    }

    #[test]
    fn test_fan_in_uniform_bound() {
        let (_client, device) = cpu_setup();
        let init = Init::fan_in_uniform(4);
        assert_eq!(init, Init::Uniform(0.5));
        let mut state = GeneratorState::new(1);
        let t: Tensor<CpuRuntime> = init.build(&mut state, &[4, 4], &device).unwrap();
        assert!(t.to_vec::<f32>().iter().all(|v| v.abs() <= 0.5));
    }
}
