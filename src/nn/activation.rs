//! Activation layers

use crate::error::{Error, Result};
use crate::ops::impl_generic::layer::leaky_relu_impl;
use crate::ops::traits::ExactGeluOps;
use numr::ops::{ActivationOps, BinaryOps, ScalarOps, UnaryOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// Default `negative_slope` of [`Activation::LeakyRelu`].
pub const DEFAULT_NEGATIVE_SLOPE: f32 = 0.01;

/// Elementwise activation layer.
///
/// `Gelu` is the exact erf form, not the tanh approximation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Gelu,
    Silu,
    Sigmoid,
    Tanh,
    LeakyRelu { negative_slope: f32 },
}

impl Activation {
    /// Apply this activation to a tensor. Output shape equals input shape.
    pub fn forward<R, C>(&self, client: &C, x: &Tensor<R>) -> Result<Tensor<R>>
    where
        R: Runtime,
        C: RuntimeClient<R>
            + ActivationOps<R>
            + UnaryOps<R>
            + BinaryOps<R>
            + ScalarOps<R>
            + ExactGeluOps<R>,
    {
        match self {
            Activation::Relu => client.relu(x).map_err(Error::Numr),
            Activation::Gelu => client.gelu_erf(x),
            Activation::Silu => client.silu(x).map_err(Error::Numr),
            Activation::Sigmoid => client.sigmoid(x).map_err(Error::Numr),
            Activation::Tanh => client.tanh(x).map_err(Error::Numr),
            Activation::LeakyRelu { negative_slope } => {
                leaky_relu_impl(client, x, *negative_slope as f64)
            }
        }
    }
}

impl std::fmt::Display for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Activation::Relu => write!(f, "relu"),
            Activation::Gelu => write!(f, "gelu"),
            Activation::Silu => write!(f, "silu"),
            Activation::Sigmoid => write!(f, "sigmoid"),
            Activation::Tanh => write!(f, "tanh"),
            Activation::LeakyRelu { negative_slope } => write!(f, "leaky_relu({negative_slope})"),
        }
    }
}
