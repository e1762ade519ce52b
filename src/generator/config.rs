//! Generator configuration

use std::path::{Path, PathBuf};

/// Default seed base for the activation batch.
pub const ACTIVATION_SEED_BASE: u64 = 1000;
/// Default seed base for the module batch.
pub const MODULE_SEED_BASE: u64 = 2000;

/// Activation document, relative to the output root.
pub const ACTIVATION_DOCUMENT: &str = "TestData/IntegrationActivations/activations.json";
/// Module document, relative to the output root.
pub const MODULE_DOCUMENT: &str = "TestData/IntegrationModules/modules.json";

/// Generation configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub output_root: PathBuf,
    pub activation_seed_base: u64,
    pub module_seed_base: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            activation_seed_base: ACTIVATION_SEED_BASE,
            module_seed_base: MODULE_SEED_BASE,
        }
    }
}

impl GeneratorConfig {
    pub fn with_output_root(mut self, root: impl AsRef<Path>) -> Self {
        self.output_root = root.as_ref().to_path_buf();
        self
    }

    pub fn with_activation_seed_base(mut self, seed: u64) -> Self {
        self.activation_seed_base = seed;
        self
    }

    pub fn with_module_seed_base(mut self, seed: u64) -> Self {
        self.module_seed_base = seed;
        self
    }

    pub fn activation_path(&self) -> PathBuf {
        self.output_root.join(ACTIVATION_DOCUMENT)
    }

    pub fn module_path(&self) -> PathBuf {
        self.output_root.join(MODULE_DOCUMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.activation_seed_base, 1000);
        assert_eq!(config.module_seed_base, 2000);
        assert_eq!(
            config.activation_path(),
            Path::new("./TestData/IntegrationActivations/activations.json")
        );
    }

    #[test]
    fn test_builder() {
        let config = GeneratorConfig::default()
            .with_output_root("/tmp/fixtures")
            .with_module_seed_base(7);
        assert_eq!(config.module_seed_base, 7);
        assert_eq!(
            config.module_path(),
            Path::new("/tmp/fixtures/TestData/IntegrationModules/modules.json")
        );
    }
}
