//! Foundation types for DLite relations.
//!
//! This crate provides the value types shared by the relation store, the
//! instance collaborators and collections. Every other DLite crate depends
//! on `dlite-types`.
//!
//! # Key Types
//!
//! - [`Quad`] -- Subject/predicate/object/datatype relation with a content-derived id
//! - [`QuadPattern`] -- Exact/wildcard match over the four quad fields
//! - [`Digest`] -- 32-byte BLAKE3 content digest, carried as hex
//! - [`InstanceId`] -- UUID (and optional URI) identifying an instance

pub mod digest;
pub mod error;
pub mod identity;
pub mod quad;

pub use digest::Digest;
pub use error::TypeError;
pub use identity::{derive_uuid, InstanceId};
pub use quad::{quad_id, Quad, QuadPattern};
