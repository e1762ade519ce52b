//! Fully-connected layer

use crate::error::{Error, Result};
use crate::nn::init::Init;
use crate::nn::module::Module;
use crate::nn::param_tree::ParamTree;
use crate::rng::GeneratorState;
use numr::ops::{BinaryOps, MatmulOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// Dense linear layer: output = input @ weight^T + bias
///
/// Weight: `[out_features, in_features]`, bias: `[out_features]`.
pub struct Linear<R: Runtime> {
    weight: Tensor<R>,
    bias: Option<Tensor<R>>,
}

impl<R: Runtime> Linear<R> {
    /// Create from existing tensors.
    pub fn new(weight: Tensor<R>, bias: Option<Tensor<R>>) -> Self {
        Self { weight, bias }
    }

    /// Create with freshly drawn parameters.
    ///
    /// Weight then bias are drawn from `U(-s, s)`, `s = sqrt(1 / in_features)`.
    pub fn init(
        state: &mut GeneratorState,
        in_features: usize,
        out_features: usize,
        bias: bool,
        device: &R::Device,
    ) -> Result<Self> {
        if in_features == 0 || out_features == 0 {
            return Err(Error::config(
                "Linear",
                format!("dimensions must be positive, got {in_features} -> {out_features}"),
            ));
        }
        let init = Init::fan_in_uniform(in_features);
        let weight = init.build(state, &[out_features, in_features], device)?;
        let bias = if bias {
            Some(init.build(state, &[out_features], device)?)
        } else {
            None
        };
        Ok(Self { weight, bias })
    }

    /// Forward: input @ weight^T + bias
    ///
    /// input: `[..., in_features]`, output: `[..., out_features]`
    pub fn forward<C>(&self, client: &C, input: &Tensor<R>) -> Result<Tensor<R>>
    where
        C: RuntimeClient<R> + MatmulOps<R> + BinaryOps<R>,
    {
        let in_features = self.in_features();
        if input.shape().last() != Some(&in_features) {
            return Err(Error::config(
                "Linear",
                format!(
                    "input shape {:?} does not end in {in_features} features",
                    input.shape()
                ),
            ));
        }
        let w_t = self
            .weight
            .transpose(-2, -1)
            .map_err(Error::Numr)?
            .contiguous();
        let output = client.matmul(input, &w_t).map_err(Error::Numr)?;
        match &self.bias {
            Some(bias) => client.add(&output, bias).map_err(Error::Numr),
            None => Ok(output),
        }
    }

    pub fn in_features(&self) -> usize {
        self.weight.shape()[1]
    }

    pub fn out_features(&self) -> usize {
        self.weight.shape()[0]
    }

    pub fn weight(&self) -> &Tensor<R> {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Tensor<R>> {
        self.bias.as_ref()
    }
}

impl<R: Runtime> Module<R> for Linear<R> {
    fn parameters(&self) -> ParamTree<&Tensor<R>> {
        let tree = ParamTree::empty().with_leaf("weight", &self.weight);
        match &self.bias {
            Some(b) => tree.with_leaf("bias", b),
            None => tree,
        }
    }
}
