//! Layer resolution and single forward evaluation
//!
//! Maps a catalog name plus settings to a constructed [`Operation`]. Layers
//! with learned weights draw them from the generator state here, so
//! resolution must happen after the per-case reseed and before the input
//! draw.

use crate::catalog::kind::LayerKind;
use crate::catalog::settings::{SettingValue, Settings};
use crate::error::{Error, Result};
use crate::nn::{
    Activation, Conv1d, Conv1dConfig, Conv2d, Conv2dConfig, DEFAULT_NEGATIVE_SLOPE, Linear, Module,
    ParamTree,
};
use crate::ops::impl_generic::layer::{normalize_axis, softmax_impl};
use crate::ops::traits::{ChannelsLastConvOps, ExactGeluOps};
use crate::rng::GeneratorState;
use numr::ops::{ActivationOps, BinaryOps, MatmulOps, ScalarOps, UnaryOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;
use tracing::trace;

/// Trait alias for the client bounds every catalog layer needs.
pub trait LayerClient<R: Runtime>:
    RuntimeClient<R>
    + ActivationOps<R>
    + UnaryOps<R>
    + BinaryOps<R>
    + ScalarOps<R>
    + MatmulOps<R>
    + ExactGeluOps<R>
    + ChannelsLastConvOps<R>
{
}

impl<R, C> LayerClient<R> for C
where
    R: Runtime,
    C: RuntimeClient<R>
        + ActivationOps<R>
        + UnaryOps<R>
        + BinaryOps<R>
        + ScalarOps<R>
        + MatmulOps<R>
        + ExactGeluOps<R>
        + ChannelsLastConvOps<R>,
{
}

/// A constructed layer, ready for one forward evaluation.
pub enum Operation<R: Runtime> {
    Activation(Activation),
    /// Pure function along `axis`, nothing constructed.
    Softmax { axis: isize },
    Linear(Linear<R>),
    Conv1d(Conv1d<R>),
    Conv2d(Conv2d<R>),
}

/// Result of resolving a catalog entry.
pub struct Resolved<R: Runtime> {
    pub kind: LayerKind,
    pub operation: Operation<R>,
    /// Settings as echoed into the test case (pair settings normalized).
    pub settings: Settings,
}

const LINEAR_KEYS: &[&str] = &["inputDimensions", "outputDimensions", "bias"];
const CONV_KEYS: &[&str] = &[
    "in_channels",
    "out_channels",
    "kernel_size",
    "stride",
    "padding",
    "dilation",
    "groups",
    "bias",
];
const CONV2D_PAIRS: [&str; 4] = ["kernel_size", "stride", "padding", "dilation"];

impl<R: Runtime> Operation<R> {
    /// Resolve `name` and construct the layer.
    ///
    /// Unknown names fail with [`Error::UnresolvedLayer`]; settings that
    /// don't fit the layer fail with [`Error::InvalidConfig`].
    pub fn resolve(
        name: &str,
        settings: &Settings,
        state: &mut GeneratorState,
        device: &R::Device,
    ) -> Result<Resolved<R>> {
        let kind: LayerKind = name.parse()?;
        let layer = kind.name();
        let mut echo = settings.clone();

        let operation = match kind {
            LayerKind::Sigmoid | LayerKind::Tanh | LayerKind::Relu | LayerKind::Silu
            | LayerKind::Gelu => {
                settings.expect_keys(layer, &[])?;
                Operation::Activation(match kind {
                    LayerKind::Sigmoid => Activation::Sigmoid,
                    LayerKind::Tanh => Activation::Tanh,
                    LayerKind::Relu => Activation::Relu,
                    LayerKind::Silu => Activation::Silu,
                    _ => Activation::Gelu,
                })
            }
            LayerKind::LeakyRelu => {
                settings.expect_keys(layer, &["negative_slope"])?;
                let slope =
                    settings.float_or(layer, "negative_slope", DEFAULT_NEGATIVE_SLOPE as f64)?;
                if !slope.is_finite() {
                    return Err(Error::config(layer, "negative_slope must be finite"));
                }
                Operation::Activation(Activation::LeakyRelu {
                    negative_slope: slope as f32,
                })
            }
            LayerKind::Softmax => {
                settings.expect_keys(layer, &["axis"])?;
                Operation::Softmax {
                    axis: settings.int_or(layer, "axis", -1)? as isize,
                }
            }
            LayerKind::Linear => {
                settings.expect_keys(layer, LINEAR_KEYS)?;
                Operation::Linear(Linear::init(
                    state,
                    settings.dim(layer, "inputDimensions")?,
                    settings.dim(layer, "outputDimensions")?,
                    settings.bool_or(layer, "bias", true)?,
                    device,
                )?)
            }
            LayerKind::Conv1d => {
                settings.expect_keys(layer, CONV_KEYS)?;
                let config = Conv1dConfig::new(
                    settings.dim(layer, "in_channels")?,
                    settings.dim(layer, "out_channels")?,
                    settings.dim(layer, "kernel_size")?,
                )
                .with_stride(settings.count_or(layer, "stride", 1)?)
                .with_padding(settings.count_or(layer, "padding", 0)?)
                .with_dilation(settings.count_or(layer, "dilation", 1)?)
                .with_groups(settings.count_or(layer, "groups", 1)?)
                .with_bias(settings.bool_or(layer, "bias", true)?);
                Operation::Conv1d(Conv1d::init(state, config, device)?)
            }
            LayerKind::Conv2d => {
                settings.expect_keys(layer, CONV_KEYS)?;
                let config = Conv2dConfig::new(
                    settings.dim(layer, "in_channels")?,
                    settings.dim(layer, "out_channels")?,
                    settings.pair(layer, "kernel_size")?,
                )
                .with_stride(settings.pair_or(layer, "stride", [1, 1])?)
                .with_padding(settings.pair_or(layer, "padding", [0, 0])?)
                .with_dilation(settings.pair_or(layer, "dilation", [1, 1])?)
                .with_groups(settings.count_or(layer, "groups", 1)?)
                .with_bias(settings.bool_or(layer, "bias", true)?);
                for key in CONV2D_PAIRS {
                    if echo.get(key).is_some() {
                        let [a, b] = settings.pair(layer, key)?;
                        echo.insert(key, SettingValue::Tuple(vec![a as i64, b as i64]));
                    }
                }
                Operation::Conv2d(Conv2d::init(state, config, device)?)
            }
        };

        trace!(layer, seed = state.seed(), "resolved layer");
        Ok(Resolved {
            kind,
            operation,
            settings: echo,
        })
    }

    /// One forward evaluation. No state is touched.
    pub fn forward<C: LayerClient<R>>(&self, client: &C, x: &Tensor<R>) -> Result<Tensor<R>> {
        match self {
            Operation::Activation(act) => act.forward(client, x),
            Operation::Softmax { axis } => {
                normalize_axis(*axis, x.shape().len())
                    .map_err(|e| Error::config("Softmax", e.to_string()))?;
                softmax_impl(client, x, *axis)
            }
            Operation::Linear(layer) => layer.forward(client, x),
            Operation::Conv1d(layer) => layer.forward(client, x),
            Operation::Conv2d(layer) => layer.forward(client, x),
        }
    }

    /// Learned parameters, or `None` for parameter-free operations.
    pub fn parameters(&self) -> Option<ParamTree<&Tensor<R>>> {
        match self {
            Operation::Activation(_) | Operation::Softmax { .. } => None,
            Operation::Linear(layer) => Some(layer.parameters()),
            Operation::Conv1d(layer) => Some(layer.parameters()),
            Operation::Conv2d(layer) => Some(layer.parameters()),
        }
    }
}
