//! Instance collaborators for DLite collections.
//!
//! A collection never owns instance data itself: it records member
//! identities as relations and resolves them through an injected
//! [`InstanceRegistry`]. This crate defines those contracts and small
//! reference implementations used by tests and the command-line tool.
//!
//! # Architecture
//!
//! - **Instances** carry an explicit reference count. Every holder of a
//!   reference (the creator, a collection, a transient lookup) owns one
//!   count and must release it.
//! - **Owned references** are modelled by [`OwnedInstance`], which releases
//!   its count on drop unless ownership is handed on.
//! - **Registries** turn uuids and URIs into live instances. An instance
//!   whose count reached zero is freed and no longer resolves.
//! - **Mapping resolvers** cast an instance to another metadata schema.
//!
//! # Modules
//!
//! - [`error`] -- Error types for instance operations
//! - [`traits`] -- [`Instance`], [`InstanceRegistry`], [`MappingResolver`]
//! - [`owned`] -- The [`OwnedInstance`] guard
//! - [`data`] -- [`DataInstance`], a generic property-bag instance
//! - [`memory`] -- [`InMemoryRegistry`]

pub mod data;
pub mod error;
pub mod memory;
pub mod owned;
pub mod traits;

pub use data::{DataInstance, DataInstanceDocument};
pub use error::{InstanceError, Result};
pub use memory::InMemoryRegistry;
pub use owned::OwnedInstance;
pub use traits::{Instance, InstanceRef, InstanceRegistry, MappingResolver};
