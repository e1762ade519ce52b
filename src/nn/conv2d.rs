//! 2D convolution layer (channels-last)

use crate::error::{Error, Result};
use crate::nn::conv1d::validate_channels;
use crate::nn::init::Init;
use crate::nn::module::Module;
use crate::nn::param_tree::ParamTree;
use crate::ops::traits::{ChannelsLastConvOps, ConvGeometry};
use crate::rng::GeneratorState;
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// Conv2d hyperparameters. Pairs are `[height, width]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv2dConfig {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: [usize; 2],
    pub stride: [usize; 2],
    pub padding: [usize; 2],
    pub dilation: [usize; 2],
    pub groups: usize,
    pub bias: bool,
}

impl Conv2dConfig {
    pub fn new(in_channels: usize, out_channels: usize, kernel_size: [usize; 2]) -> Self {
        Self {
            in_channels,
            out_channels,
            kernel_size,
            stride: [1, 1],
            padding: [0, 0],
            dilation: [1, 1],
            groups: 1,
            bias: true,
        }
    }

    pub fn with_stride(mut self, stride: [usize; 2]) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_padding(mut self, padding: [usize; 2]) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_dilation(mut self, dilation: [usize; 2]) -> Self {
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
            "Conv2d",
            self.in_channels,
            self.out_channels,
            self.groups,
        )?;
        let positive = self
            .kernel_size
            .iter()
            .chain(&self.stride)
            .chain(&self.dilation)
            .all(|v| *v > 0);
        if !positive {
            return Err(Error::config(
                "Conv2d",
                "kernel_size, stride and dilation must be positive",
            ));
        }
        Ok(())
    }

    /// `(height, width)` geometry.
    pub fn geometry(&self) -> (ConvGeometry, ConvGeometry) {
        (
            ConvGeometry::new(self.stride[0], self.padding[0], self.dilation[0]),
            ConvGeometry::new(self.stride[1], self.padding[1], self.dilation[1]),
        )
    }
}

/// 2D convolution layer
///
/// Weight: `[out_channels, kh, kw, in_channels/groups]`
/// Input:  `[batch, height, width, in_channels]`
/// Output: `[batch, height_out, width_out, out_channels]`
pub struct Conv2d<R: Runtime> {
    weight: Tensor<R>,
    bias: Option<Tensor<R>>,
    config: Conv2dConfig,
}

impl<R: Runtime> Conv2d<R> {
    /// Create with freshly drawn weights, `U(-s, s)` with
    /// `s = sqrt(1 / (in_channels * kh * kw))`. Bias starts at zero.
    pub fn init(
        state: &mut GeneratorState,
        config: Conv2dConfig,
        device: &R::Device,
    ) -> Result<Self> {
        config.validate()?;
        let [kh, kw] = config.kernel_size;
        let weight = Init::fan_in_uniform(config.in_channels * kh * kw).build(
            state,
            &[
                config.out_channels,
                kh,
                kw,
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

    pub fn forward<C>(&self, client: &C, input: &Tensor<R>) -> Result<Tensor<R>>
    where
        C: RuntimeClient<R> + ChannelsLastConvOps<R>,
    {
        let shape = input.shape();
        if shape.len() != 4 || shape[3] != self.config.in_channels {
            return Err(Error::config(
                "Conv2d",
                format!(
                    "expected input [batch, height, width, {}], got {shape:?}",
                    self.config.in_channels
                ),
            ));
        }
        let (gh, gw) = self.config.geometry();
        let [kh, kw] = self.config.kernel_size;
        gh.output_len(shape[1], kh)
            .and_then(|_| gw.output_len(shape[2], kw))
            .map_err(|e| Error::config("Conv2d", e.to_string()))?;
        client.conv2d_nhwc(
            input,
            &self.weight,
            self.bias.as_ref(),
            (gh, gw),
            self.config.groups,
        )
    }

    pub fn config(&self) -> &Conv2dConfig {
        &self.config
    }

    pub fn weight(&self) -> &Tensor<R> {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Tensor<R>> {
        self.bias.as_ref()
    }
}

impl<R: Runtime> Module<R> for Conv2d<R> {
    fn parameters(&self) -> ParamTree<&Tensor<R>> {
        let tree = ParamTree::empty().with_leaf("weight", &self.weight);
        match &self.bias {
            Some(b) => tree.with_leaf("bias", b),
            None => tree,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::cpu_setup;
    use numr::runtime::cpu::CpuRuntime;

    #[test]
    fn test_conv2d_same_padding_preserves_extent() {
        let (client, device) = cpu_setup();
        let mut state = GeneratorState::new(2003);
        let config = Conv2dConfig::new(2, 3, [3, 3]).with_padding([1, 1]);
        let conv = Conv2d::<CpuRuntime>::init(&mut state, config, &device).unwrap();
        let input = state.normal::<CpuRuntime>(&[2, 6, 6, 2], &device);
        let out = conv.forward(&client, &input).unwrap();
        assert_eq!(out.shape(), &[2, 6, 6, 3]);
    }

    #[test]
    fn test_conv2d_strided_shape() {
        let (client, device) = cpu_setup();
        let mut state = GeneratorState::new(5);
        let config = Conv2dConfig::new(1, 4, [3, 2])
            .with_stride([2, 1])
            .with_bias(false);
        let conv = Conv2d::<CpuRuntime>::init(&mut state, config, &device).unwrap();
        assert!(conv.bias().is_none());
        let input = state.normal::<CpuRuntime>(&[1, 7, 5, 1], &device);
        let out = conv.forward(&client, &input).unwrap();
        // (7 - 3) / 2 + 1 = 3, (5 - 2) / 1 + 1 = 4
        assert_eq!(out.shape(), &[1, 3, 4, 4]);
    }

    #[test]
    fn test_conv2d_weight_layout_and_bound() {
        let (_client, device) = cpu_setup();
        let mut state = GeneratorState::new(5);
        let conv = Conv2d::<CpuRuntime>::init(&mut state, Conv2dConfig::new(2, 3, [3, 3]), &device)
            .unwrap();
        assert_eq!(conv.weight().shape(), &[3, 3, 3, 2]);
        let s = (1.0f32 / 18.0).sqrt();
        assert!(conv.weight().to_vec::<f32>().iter().all(|v| v.abs() <= s));
        assert_eq!(conv.bias().unwrap().to_vec::<f32>(), vec![0.0; 3]);
    }

    #[test]
    fn test_conv2d_invalid_config() {
        let (_client, device) = cpu_setup();
        let mut state = GeneratorState::new(5);
        let bad = Conv2dConfig::new(2, 3, [3, 0]);
        assert!(matches!(
            Conv2d::<CpuRuntime>::init(&mut state, bad, &device),
            Err(Error::InvalidConfig { .. })
        ));
    }
}
