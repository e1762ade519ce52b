//! Closed set of layer kinds the resolver can construct

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Every layer the generator knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Sigmoid,
    Tanh,
    Relu,
    LeakyRelu,
    Softmax,
    Silu,
    Gelu,
    Linear,
    Conv1d,
    Conv2d,
}

impl LayerKind {
    pub const ALL: [LayerKind; 10] = [
        LayerKind::Sigmoid,
        LayerKind::Tanh,
        LayerKind::Relu,
        LayerKind::LeakyRelu,
        LayerKind::Softmax,
        LayerKind::Silu,
        LayerKind::Gelu,
        LayerKind::Linear,
        LayerKind::Conv1d,
        LayerKind::Conv2d,
    ];

    /// Canonical catalog name.
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Sigmoid => "Sigmoid",
            LayerKind::Tanh => "Tanh",
            LayerKind::Relu => "ReLU",
            LayerKind::LeakyRelu => "LeakyReLU",
            LayerKind::Softmax => "Softmax",
            LayerKind::Silu => "SiLU",
            LayerKind::Gelu => "GELU",
            LayerKind::Linear => "Linear",
            LayerKind::Conv1d => "Conv1d",
            LayerKind::Conv2d => "Conv2d",
        }
    }
}

impl FromStr for LayerKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        LayerKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| Error::UnresolvedLayer {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
