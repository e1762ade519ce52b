//! Fixture generation
//!
//! Builds the activation and module batches over the built-in catalogs,
//! encodes them, and writes or checks the documents under the output root.
//! Each document is fully built in memory before anything touches disk.

pub mod assemble;
pub mod config;
pub mod document;

pub use assemble::{build_activation_batch, build_module_batch};
pub use config::{ACTIVATION_DOCUMENT, GeneratorConfig, MODULE_DOCUMENT};
pub use document::{DocumentStatus, check_document, encode, write_document};

use crate::catalog::{activation_catalog, module_catalog};
use crate::error::Result;
use numr::runtime::cpu::{CpuClient, CpuDevice};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// The two persisted batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchKind {
    Activations,
    Modules,
}

impl BatchKind {
    pub const ALL: [BatchKind; 2] = [BatchKind::Activations, BatchKind::Modules];

    /// Singular label used in console messages.
    pub fn label(&self) -> &'static str {
        match self {
            BatchKind::Activations => "activation",
            BatchKind::Modules => "module",
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixture generator on the CPU runtime.
pub struct Generator {
    config: GeneratorConfig,
    client: CpuClient,
    device: CpuDevice,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        Self {
            config,
            client,
            device,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Destination of `kind`'s document.
    pub fn path(&self, kind: BatchKind) -> PathBuf {
        match kind {
            BatchKind::Activations => self.config.activation_path(),
            BatchKind::Modules => self.config.module_path(),
        }
    }

    /// Build and encode one batch in memory.
    pub fn render(&self, kind: BatchKind) -> Result<Vec<u8>> {
        match kind {
            BatchKind::Activations => encode(&build_activation_batch(
                &self.client,
                &self.device,
                &activation_catalog(),
                self.config.activation_seed_base,
            )?),
            BatchKind::Modules => encode(&build_module_batch(
                &self.client,
                &self.device,
                &module_catalog(),
                self.config.module_seed_base,
            )?),
        }
    }

    /// Render and write one batch, returning the written path.
    pub fn write(&self, kind: BatchKind) -> Result<PathBuf> {
        let bytes = self.render(kind)?;
        let path = self.path(kind);
        write_document(&path, &bytes)?;
        info!(batch = %kind, path = %path.display(), bytes = bytes.len(), "wrote document");
        Ok(path)
    }

    /// Render one batch and compare it with the document on disk.
    pub fn check(&self, kind: BatchKind) -> Result<(PathBuf, DocumentStatus)> {
        let bytes = self.render(kind)?;
        let path = self.path(kind);
        let status = check_document(&path, &bytes)?;
        if status.is_up_to_date() {
            info!(batch = %kind, path = %path.display(), "document up to date");
        } else {
            warn!(batch = %kind, path = %path.display(), ?status, "document drifted");
        }
        Ok((path, status))
    }
}
