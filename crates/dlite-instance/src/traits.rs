//! Collaborator traits consumed by collections.
//!
//! Any instance type (plain data instances, collections, foreign-language
//! wrappers) implements [`Instance`]; any lookup service implements
//! [`InstanceRegistry`].

use std::rc::Rc;

use dlite_types::{Digest, InstanceId};
use serde_json::Value;

use crate::error::Result;
use crate::owned::OwnedInstance;

/// Shared handle to an instance. Holding a handle does not by itself own a
/// reference count; see [`OwnedInstance`] for that.
pub type InstanceRef = Rc<dyn Instance>;

/// A reference-counted, metadata-described data instance.
///
/// Reference counting is explicit and independent of `Rc` strong counts:
/// a new instance starts with a count of one (its creator's reference) and
/// is considered freed once the count reaches zero.
pub trait Instance {
    /// Identity of the instance.
    fn id(&self) -> &InstanceId;

    fn uuid(&self) -> &str {
        &self.id().uuid
    }

    fn uri(&self) -> Option<&str> {
        self.id().uri.as_deref()
    }

    /// URI of the metadata (schema) describing this instance.
    fn meta_uri(&self) -> &str;

    /// Take one more reference. Returns the new count.
    fn incref(&self) -> usize;

    /// Release one reference. Returns the new count.
    fn decref(&self) -> usize;

    /// Current reference count.
    fn refcount(&self) -> usize;

    /// Read a property as JSON.
    fn get_property(&self, name: &str) -> Result<Value>;

    /// Replace a property value.
    fn set_property(&self, name: &str, value: Value) -> Result<()>;

    /// Digest of the instance content. Identity (uuid/uri) is not content.
    fn content_hash(&self) -> Result<Digest>;
}

/// Process-wide lookup of live instances, injected into collections.
pub trait InstanceRegistry {
    /// Make `instance` resolvable by its uuid.
    ///
    /// Registering the same instance twice is a no-op. Registering a
    /// different instance under an existing uuid fails.
    fn register(&self, instance: InstanceRef) -> Result<()>;

    /// Resolve a uuid or URI to a live instance.
    ///
    /// The returned guard owns one new reference (the transient lookup
    /// reference), released when the guard drops.
    fn resolve(&self, id: &str) -> Option<OwnedInstance>;
}

/// Casts instances to other metadata schemas.
pub trait MappingResolver {
    /// Return a new reference to `instance` expressed with metadata
    /// `output_meta`.
    fn map(&self, instance: &InstanceRef, output_meta: &str) -> Result<OwnedInstance>;
}
