//! Catalog entries and the built-in catalogs

use crate::catalog::settings::Settings;

/// Input shape for activation entries that don't override it.
pub const DEFAULT_ACTIVATION_SHAPE: [usize; 3] = [2, 4, 3];

/// One layer to generate a test case for.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    /// Layer name, resolved by [`LayerKind`](crate::catalog::LayerKind).
    pub name: String,
    /// Label written to the test case in place of `name`.
    pub alias: Option<String>,
    pub settings: Settings,
    /// Input shape; activations fall back to [`DEFAULT_ACTIVATION_SHAPE`].
    pub shape: Option<Vec<usize>>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            settings: Settings::new(),
            shape: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_shape(mut self, shape: &[usize]) -> Self {
        self.shape = Some(shape.to_vec());
        self
    }

    /// Label used for the test case name and `layer` field.
    pub fn label(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Activation batch catalog.
pub fn activation_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("Sigmoid"),
        CatalogEntry::new("Tanh"),
        CatalogEntry::new("ReLU"),
        CatalogEntry::new("LeakyReLU").with_settings(Settings::new().with("negative_slope", 0.2)),
        CatalogEntry::new("Softmax")
            .with_settings(Settings::new().with("axis", -1i64))
            .with_shape(&[2, 4]),
        CatalogEntry::new("SiLU"),
        CatalogEntry::new("GELU").with_alias("Gelu"),
    ]
}

/// Module batch catalog.
pub fn module_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("Linear")
            .with_settings(
                Settings::new()
                    .with("inputDimensions", 6i64)
                    .with("outputDimensions", 4i64)
                    .with("bias", true),
            )
            .with_shape(&[3, 6]),
        CatalogEntry::new("Linear")
            .with_settings(
                Settings::new()
                    .with("inputDimensions", 5i64)
                    .with("outputDimensions", 2i64)
                    .with("bias", false),
            )
            .with_shape(&[1, 5]),
        CatalogEntry::new("Conv1d")
            .with_settings(
                Settings::new()
                    .with("in_channels", 3i64)
                    .with("out_channels", 2i64)
                    .with("kernel_size", 3i64)
                    .with("stride", 1i64)
                    .with("padding", 1i64)
                    .with("bias", true),
            )
            .with_shape(&[2, 8, 3]),
        CatalogEntry::new("Conv2d")
            .with_settings(
                Settings::new()
                    .with("in_channels", 2i64)
                    .with("out_channels", 3i64)
                    .with("kernel_size", [3i64, 3])
                    .with("stride", [1i64, 1])
                    .with("padding", [1i64, 1])
                    .with("bias", true),
            )
            .with_shape(&[2, 6, 6, 2]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LayerKind;

    #[test]
    fn test_catalogs_resolve() {
        for entry in activation_catalog().iter().chain(&module_catalog()) {
            assert!(entry.name.parse::<LayerKind>().is_ok(), "{}", entry.name);
        }
    }

    #[test]
    fn test_alias_label() {
        let catalog = activation_catalog();
        assert_eq!(catalog[6].label(), "Gelu");
        assert_eq!(catalog[6].name, "GELU");
        assert_eq!(catalog[0].label(), "Sigmoid");
    }

    #[test]
    fn test_module_entries_have_shapes() {
        assert!(module_catalog().iter().all(|e| e.shape.is_some()));
    }
}
