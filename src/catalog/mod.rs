pub mod entry;
pub mod kind;
pub mod resolver;
pub mod settings;

pub use entry::{CatalogEntry, DEFAULT_ACTIVATION_SHAPE, activation_catalog, module_catalog};
pub use kind::LayerKind;
pub use resolver::{LayerClient, Operation, Resolved};
pub use settings::{SettingValue, Settings};
