//! DLite collections.
//!
//! A [`Collection`] is an instance that aggregates other instances and the
//! relations between them. Membership, metadata identity, dimension maps
//! and cached hashes are all stored as relations in one relation store,
//! using the reserved predicates of [`vocab`].
//!
//! # Key Types
//!
//! - [`Collection`] -- Membership, lookup, iteration and lifecycle
//! - [`Members`] / [`MembersNew`] -- Cursor-backed member iterators
//! - [`CollectionDocument`] -- Serialized form (`relations` rows)
//! - [`LoadReport`] -- Outcome of reloading relations
//! - [`CollectionConfig`] -- Store configuration and load strictness
//!
//! # Ownership
//!
//! A collection holds one reference on every member it tracks. Members are
//! never stored inline: they are resolved by uuid through the
//! [`InstanceRegistry`](dlite_instance::InstanceRegistry) handed to the
//! collection at creation.

pub mod collection;
pub mod config;
pub mod error;
pub mod hash;
pub mod persist;
pub mod vocab;

pub use collection::{Collection, Members, MembersNew, ParentRef};
pub use config::CollectionConfig;
pub use error::{CollectionError, CollectionResult};
pub use persist::{
    quad_to_row, row_to_quad, CollectionDimensions, CollectionDocument, CollectionProperties,
    LoadReport, RelationRow,
};
