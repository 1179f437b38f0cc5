use serde::{Deserialize, Serialize};

/// Number of rows the array store grows by.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Configuration for a relation store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Rows are allocated in chunks of this many quads.
    pub chunk_size: usize,
    /// Prepended to every quad id the store computes.
    pub id_namespace: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            id_namespace: None,
        }
    }
}

impl StoreConfig {
    /// Default configuration with quad ids prefixed by `namespace`.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            id_namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    /// Chunk size, never zero.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}
