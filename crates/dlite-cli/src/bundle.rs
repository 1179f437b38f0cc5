//! Bundle files: a serialized collection together with its member
//! instances.

use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use dlite_collection::{Collection, CollectionConfig, CollectionDocument, LoadReport};
use dlite_instance::{
    DataInstance, DataInstanceDocument, InMemoryRegistry, InstanceRef, InstanceRegistry,
};
use dlite_triplestore::StoreConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
pub struct Bundle {
    pub collection: CollectionDocument,
    #[serde(default)]
    pub instances: Vec<DataInstanceDocument>,
}

impl Bundle {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read bundle {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("malformed bundle {}", path.display()))
    }
}

/// A bundle brought to life: instances registered, collection loaded.
pub struct LoadedBundle {
    pub collection: Collection,
    pub report: LoadReport,
    /// Creator references to the bundled instances.
    pub instances: Vec<InstanceRef>,
}

pub fn config_for(namespace: Option<&str>, strict: bool) -> CollectionConfig {
    let store = match namespace {
        Some(ns) => StoreConfig::with_namespace(ns),
        None => StoreConfig::default(),
    };
    CollectionConfig {
        store,
        strict_load: strict,
    }
}

pub fn open(bundle: Bundle, config: CollectionConfig) -> anyhow::Result<LoadedBundle> {
    let registry = Rc::new(InMemoryRegistry::new());
    let mut instances = Vec::with_capacity(bundle.instances.len());
    for doc in bundle.instances {
        let uuid = doc.uuid.clone();
        let instance = DataInstance::from_document(doc)
            .with_context(|| format!("invalid instance {uuid}"))?
            .into_ref();
        registry.register(Rc::clone(&instance))?;
        instances.push(instance);
    }
    debug!(instances = instances.len(), "bundle instances registered");

    let (collection, report) =
        Collection::from_document_with_config(bundle.collection, registry, config)
            .context("cannot load collection")?;
    Ok(LoadedBundle {
        collection,
        report,
        instances,
    })
}

pub fn open_path(path: &Path, config: CollectionConfig) -> anyhow::Result<LoadedBundle> {
    open(Bundle::read(path)?, config)
}
