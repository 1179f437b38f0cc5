use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use dlite_crypto::ContentHasher;
use dlite_types::{derive_uuid, Digest, InstanceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{InstanceError, Result};
use crate::traits::{Instance, InstanceRef};

/// A generic instance: a metadata URI plus a fixed set of named JSON
/// properties.
///
/// The property set is fixed at construction; `set_property` only replaces
/// values of declared properties.
pub struct DataInstance {
    id: InstanceId,
    meta: String,
    properties: RefCell<BTreeMap<String, Value>>,
    refcount: Cell<usize>,
}

impl DataInstance {
    /// Create an instance of `meta` with no properties.
    ///
    /// `id` follows [`derive_uuid`]: absent means a random uuid, a uuid is
    /// used as is, anything else becomes the instance URI.
    pub fn new(meta: impl Into<String>, id: Option<&str>) -> Result<Self> {
        Ok(Self {
            id: derive_uuid(id)?,
            meta: meta.into(),
            properties: RefCell::new(BTreeMap::new()),
            refcount: Cell::new(1),
        })
    }

    /// Declare a property with an initial value.
    pub fn with_property(self, name: impl Into<String>, value: Value) -> Self {
        self.properties.borrow_mut().insert(name.into(), value);
        self
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> InstanceRef {
        Rc::new(self)
    }

    /// Names of all declared properties, sorted.
    pub fn property_names(&self) -> Vec<String> {
        self.properties.borrow().keys().cloned().collect()
    }

    pub fn to_document(&self) -> DataInstanceDocument {
        DataInstanceDocument {
            uuid: self.id.uuid.clone(),
            uri: self.id.uri.clone(),
            meta: self.meta.clone(),
            properties: self.properties.borrow().clone(),
        }
    }

    pub fn from_document(doc: DataInstanceDocument) -> Result<Self> {
        let derived = derive_uuid(Some(&doc.uuid))?;
        let id = InstanceId {
            uuid: derived.uuid,
            uri: doc.uri,
        };
        Ok(Self {
            id,
            meta: doc.meta,
            properties: RefCell::new(doc.properties),
            refcount: Cell::new(1),
        })
    }
}

impl Instance for DataInstance {
    fn id(&self) -> &InstanceId {
        &self.id
    }

    fn meta_uri(&self) -> &str {
        &self.meta
    }

    fn incref(&self) -> usize {
        let count = self.refcount.get() + 1;
        self.refcount.set(count);
        count
    }

    fn decref(&self) -> usize {
        let count = self.refcount.get();
        if count == 0 {
            warn!(uuid = %self.id.uuid, "decref on freed instance");
            return 0;
        }
        self.refcount.set(count - 1);
        count - 1
    }

    fn refcount(&self) -> usize {
        self.refcount.get()
    }

    fn get_property(&self, name: &str) -> Result<Value> {
        self.properties
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| InstanceError::UnknownProperty {
                instance: self.id.to_string(),
                name: name.to_string(),
            })
    }

    fn set_property(&self, name: &str, value: Value) -> Result<()> {
        let mut properties = self.properties.borrow_mut();
        let slot = properties
            .get_mut(name)
            .ok_or_else(|| InstanceError::UnknownProperty {
                instance: self.id.to_string(),
                name: name.to_string(),
            })?;
        *slot = value;
        Ok(())
    }

    fn content_hash(&self) -> Result<Digest> {
        let mut stream = ContentHasher::INSTANCE.stream();
        stream.update_field(&self.meta);
        for (name, value) in self.properties.borrow().iter() {
            let encoded =
                serde_json::to_string(value).map_err(|e| InstanceError::Serialization(e.to_string()))?;
            stream.update_field(name).update_field(&encoded);
        }
        Ok(stream.finalize())
    }
}

impl std::fmt::Debug for DataInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataInstance")
            .field("id", &self.id)
            .field("meta", &self.meta)
            .field("refcount", &self.refcount.get())
            .finish()
    }
}

/// Serialized form of a [`DataInstance`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataInstanceDocument {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub meta: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}
