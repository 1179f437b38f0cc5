//! In-memory instance registry for testing and ephemeral use.
//!
//! [`InMemoryRegistry`] keeps every registered instance in a `HashMap`
//! keyed by uuid. Instances whose reference count has dropped to zero are
//! treated as freed: they stop resolving and are evicted on the next
//! lookup.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use dlite_types::derive_uuid;
use tracing::debug;

use crate::error::{InstanceError, Result};
use crate::owned::OwnedInstance;
use crate::traits::{InstanceRef, InstanceRegistry};

/// An in-memory implementation of [`InstanceRegistry`].
#[derive(Default)]
pub struct InMemoryRegistry {
    instances: RefCell<HashMap<String, InstanceRef>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the instance registered under `id`. Returns it if present.
    pub fn unregister(&self, id: &str) -> Option<InstanceRef> {
        let uuid = derive_uuid(Some(id)).ok()?.uuid;
        self.instances.borrow_mut().remove(&uuid)
    }

    /// Returns `true` if a live instance is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        let Ok(derived) = derive_uuid(Some(id)) else {
            return false;
        };
        self.instances
            .borrow()
            .get(&derived.uuid)
            .is_some_and(|inst| inst.refcount() > 0)
    }

    /// Number of registered instances, freed ones not yet evicted included.
    pub fn len(&self) -> usize {
        self.instances.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.borrow().is_empty()
    }
}

impl InstanceRegistry for InMemoryRegistry {
    fn register(&self, instance: InstanceRef) -> Result<()> {
        let mut instances = self.instances.borrow_mut();
        let uuid = instance.uuid().to_string();
        if let Some(existing) = instances.get(&uuid) {
            if std::ptr::addr_eq(Rc::as_ptr(existing), Rc::as_ptr(&instance)) {
                return Ok(());
            }
            if existing.refcount() > 0 {
                return Err(InstanceError::UuidConflict { uuid });
            }
        }
        debug!(uuid = %uuid, meta = instance.meta_uri(), "registered instance");
        instances.insert(uuid, instance);
        Ok(())
    }

    fn resolve(&self, id: &str) -> Option<OwnedInstance> {
        let uuid = derive_uuid(Some(id)).ok()?.uuid;
        let instance = self.instances.borrow().get(&uuid).cloned()?;
        if instance.refcount() == 0 {
            debug!(uuid = %uuid, "evicting freed instance");
            self.instances.borrow_mut().remove(&uuid);
            return None;
        }
        Some(OwnedInstance::acquire(&instance))
    }
}

impl std::fmt::Debug for InMemoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRegistry")
            .field("instances", &self.instances.borrow().len())
            .finish()
    }
}
