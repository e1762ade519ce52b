//! goldvec error types

use std::path::PathBuf;

/// goldvec result type
pub type Result<T> = std::result::Result<T, Error>;

/// goldvec errors
///
/// Every variant is fatal for a generation run: a batch is either produced
/// in full or not written at all.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from numr operations
    #[error("numr error: {0}")]
    Numr(#[from] numr::error::Error),

    /// Catalog names a layer the resolver cannot construct
    #[error("unresolved layer: {name}")]
    UnresolvedLayer {
        /// The layer name as written in the catalog
        name: String,
    },

    /// Settings incompatible with the target layer
    #[error("invalid configuration for {layer}: {reason}")]
    InvalidConfig {
        /// Layer being configured
        layer: String,
        /// Description of what went wrong
        reason: String,
    },

    /// Invalid argument to an operation
    #[error("invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// Argument name
        arg: &'static str,
        /// Why it's invalid
        reason: String,
    },

    /// Tensor element type has no record encoding
    #[error("unencodable tensor: dtype {dtype}")]
    UnencodableTensor {
        /// Debug name of the element type
        dtype: String,
    },

    /// Malformed tensor record (decode side)
    #[error("invalid tensor record: {reason}")]
    InvalidRecord {
        /// Description of what went wrong
        reason: String,
    },

    /// Filesystem error while writing or checking a document
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidConfig`].
    pub(crate) fn config(layer: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            layer: layer.into(),
            reason: reason.into(),
        }
    }
}
