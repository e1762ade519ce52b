//! Deterministic random stream for inputs and weight initialization.
//!
//! There is no process-wide RNG: a [`GeneratorState`] value is threaded
//! through every step that consumes randomness. The order of consumption per
//! test case is fixed (seed, construct layer, draw input), so two runs with
//! the same catalog produce identical tensors.
//!
//! The stream is `ChaCha8Rng`, which is identical across platforms and
//! `rand` releases.

use crate::error::{Error, Result};
use numr::runtime::Runtime;
use numr::tensor::Tensor;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{StandardNormal, Uniform};

/// Seedable random stream shared by one generation pass.
#[derive(Debug, Clone)]
pub struct GeneratorState {
    rng: ChaCha8Rng,
    seed: u64,
}

impl GeneratorState {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Reset the stream to the start of `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.seed = seed;
    }

    /// Seed of the most recent reset.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw `numel(shape)` standard-normal f32 values from the current position.
    pub fn normal_values(&mut self, shape: &[usize]) -> Vec<f32> {
        let n: usize = shape.iter().product();
        (0..n).map(|_| self.rng.sample::<f32, _>(StandardNormal)).collect()
    }

    /// Draw a standard-normal tensor from the current position of the stream.
    pub fn normal<R: Runtime>(&mut self, shape: &[usize], device: &R::Device) -> Tensor<R> {
        let data = self.normal_values(shape);
        Tensor::<R>::from_slice(&data, shape, device)
    }

    /// Draw `numel(shape)` values from `U[low, high)`.
    pub fn uniform_values(&mut self, low: f32, high: f32, shape: &[usize]) -> Result<Vec<f32>> {
        if !(low < high) {
            return Err(Error::InvalidArgument {
                arg: "bounds",
                reason: format!("uniform requires low < high, got [{low}, {high})"),
            });
        }
        let dist = Uniform::new(low, high);
        let n: usize = shape.iter().product();
        Ok((0..n).map(|_| self.rng.sample(&dist)).collect())
    }

    /// Draw a tensor from `U[low, high)`.
    pub fn uniform<R: Runtime>(
        &mut self,
        low: f32,
        high: f32,
        shape: &[usize],
        device: &R::Device,
    ) -> Result<Tensor<R>> {
        let data = self.uniform_values(low, high, shape)?;
        Ok(Tensor::<R>::from_slice(&data, shape, device))
    }
}
