use dlite_triplestore::StoreConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Configuration of the underlying relation store.
    pub store: StoreConfig,
    /// Fail `load_relations` when a member cannot be resolved. The
    /// relations are loaded either way.
    pub strict_load: bool,
}

impl CollectionConfig {
    /// Default configuration with strict loading.
    pub fn strict() -> Self {
        Self {
            strict_load: true,
            ..Default::default()
        }
    }

    /// Default configuration over the given store configuration.
    pub fn with_store(store: StoreConfig) -> Self {
        Self {
            store,
            ..Default::default()
        }
    }
}
