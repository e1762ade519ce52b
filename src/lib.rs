//! # goldvec
//!
//! **Deterministic golden test vectors for neural-network layers, built on numr.**
//!
//! goldvec runs a fixed catalog of layers (activations, Linear, Conv1d,
//! Conv2d) on seeded random inputs and records configuration, input,
//! output and learned parameters as JSON documents. An independent layer
//! implementation can then be checked against those documents.
//!
//! ## Design
//!
//! - **Explicit RNG state**: [`rng::GeneratorState`] is threaded through
//!   construction and input draws; each case reseeds it with `base + index`
//! - **Closed layer set**: [`catalog::LayerKind`] resolves names, anything
//!   else is [`Error::UnresolvedLayer`]
//! - **Parameter trees**: [`nn::ParamTree`] flattens to dotted paths
//! - **Extension traits**: kernels numr lacks (exact GELU, channels-last
//!   convolution) are implemented on numr's clients
//! - **Lossless records**: [`record::TensorRecord`] decodes back to the
//!   exact tensor

pub mod catalog;
pub mod error;
pub mod generator;
pub mod nn;
pub mod ops;
pub mod record;
pub mod rng;

pub use catalog::{CatalogEntry, LayerKind, Operation, Settings};
pub use error::{Error, Result};
pub use generator::{BatchKind, Generator, GeneratorConfig};
pub use record::{ActivationCase, Batch, ModuleCase, ParameterRecord, TensorRecord};
pub use rng::GeneratorState;

// Re-export numr types that users will commonly need
pub use numr::dtype::DType;
pub use numr::runtime::{Runtime, RuntimeClient};
pub use numr::tensor::Tensor;
