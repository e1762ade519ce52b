//! 1D convolution layer (channels-last)

use crate::error::{Error, Result};
use crate::nn::init::Init;
use crate::nn::module::Module;
use crate::nn::param_tree::ParamTree;
use crate::ops::traits::{ChannelsLastConvOps, ConvGeometry};
use crate::rng::GeneratorState;
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// Conv1d hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv1dConfig {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: usize,
    pub stride: usize,
    pub padding: usize,
    pub dilation: usize,
    pub groups: usize,
    pub bias: bool,
}

impl Conv1dConfig {
    /// stride 1, no padding, dilation 1, one group, with bias.
    pub fn new(in_channels: usize, out_channels: usize, kernel_size: usize) -> Self {
        Self {
            in_channels,
            out_channels,
            kernel_size,
            stride: 1,
            padding: 0,
            dilation: 1,
            groups: 1,
            bias: true,
        }
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_dilation(mut self, dilation: usize) -> Self {
        self.dilation = dilation;
        self
    }

    pub fn with_groups(mut self, groups: usize) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_channels(
            "Conv1d",
            self.in_channels,
            self.out_channels,
            self.groups,
        )?;
        if self.kernel_size == 0 || self.stride == 0 || self.dilation == 0 {
            return Err(Error::config(
                "Conv1d",
                "kernel_size, stride and dilation must be positive",
            ));
        }
        Ok(())
    }

    pub fn geometry(&self) -> ConvGeometry {
        ConvGeometry::new(self.stride, self.padding, self.dilation)
    }
}

pub(crate) fn validate_channels(
    layer: &str,
    in_channels: usize,
    out_channels: usize,
    groups: usize,
) -> Result<()> {
    if in_channels == 0 || out_channels == 0 || groups == 0 {
        return Err(Error::config(
            layer,
            "in_channels, out_channels and groups must be positive",
        ));
    }
    if in_channels % groups != 0 || out_channels % groups != 0 {
        return Err(Error::config(
            layer,
            format!(
                "channels ({in_channels} -> {out_channels}) must be divisible by groups ({groups})"
            ),
        ));
    }
    Ok(())
}

/// 1D convolution layer: output = conv1d(input, weight) + bias
///
/// Weight: `[out_channels, kernel_size, in_channels/groups]`
/// Input:  `[batch, length, in_channels]`
/// Output: `[batch, length_out, out_channels]`
pub struct Conv1d<R: Runtime> {
    weight: Tensor<R>,
    bias: Option<Tensor<R>>,
    config: Conv1dConfig,
}

impl<R: Runtime> Conv1d<R> {
    /// Create with freshly drawn weights, `U(-s, s)` with
    /// `s = sqrt(1 / (in_channels * kernel_size))`. Bias starts at zero.
    pub fn init(
        state: &mut GeneratorState,
        config: Conv1dConfig,
        device: &R::Device,
    ) -> Result<Self> {
        config.validate()?;
        let weight = Init::fan_in_uniform(config.in_channels * config.kernel_size).build(
            state,
            &[
                config.out_channels,
                config.kernel_size,
                config.in_channels / config.groups,
            ],
            device,
        )?;
        let bias = if config.bias {
            Some(Init::Zeros.build(state, &[config.out_channels], device)?)
        } else {
            None
        };
        Ok(Self {
            weight,
            bias,
            config,
        })
    }

    /// Forward pass.
    ///
    /// Input: `[batch, length, in_channels]`
    /// Output: `[batch, length_out, out_channels]`
    pub fn forward<C>(&self, client: &C, input: &Tensor<R>) -> Result<Tensor<R>>
    where
        C: RuntimeClient<R> + ChannelsLastConvOps<R>,
    {
        let shape = input.shape();
        if shape.len() != 3 || shape[2] != self.config.in_channels {
            return Err(Error::config(
                "Conv1d",
                format!(
                    "expected input [batch, length, {}], got {shape:?}",
                    self.config.in_channels
                ),
            ));
        }
        self.config
            .geometry()
            .output_len(shape[1], self.config.kernel_size)
            .map_err(|e| Error::config("Conv1d", e.to_string()))?;
        client.conv1d_nlc(
            input,
            &self.weight,
            self.bias.as_ref(),
            self.config.geometry(),
            self.config.groups,
        )
    }

    pub fn config(&self) -> &Conv1dConfig {
        &self.config
    }

    pub fn weight(&self) -> &Tensor<R> {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Tensor<R>> {
        self.bias.as_ref()
    }
}

impl<R: Runtime> Module<R> for Conv1d<R> {
    fn parameters(&self) -> ParamTree<&Tensor<R>> {
        let tree = ParamTree::empty().with_leaf("weight", &self.weight);
        match &self.bias {
            Some(b) => tree.with_leaf("bias", b),
            None => tree,
        }
    }
}
