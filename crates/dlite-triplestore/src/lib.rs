//! Relation store for DLite collections.
//!
//! This crate implements an array-backed, hash-indexed set of [`Quad`]s with
//! cursor-based iteration that tolerates mutation while cursors are open.
//! Every collection owns exactly one store and talks to it only through the
//! [`RelationBackend`] trait, so the array store can be swapped for an
//! external RDF engine without touching collection code.
//!
//! # Storage Backends
//!
//! All backends implement the [`RelationBackend`] trait:
//!
//! - [`ArrayStore`] -- growable slot array plus an `id -> slot` index
//!
//! # Design Rules
//!
//! 1. Quads are immutable once added; identical content deduplicates by id.
//! 2. While any [`Cursor`] is open, removed rows become tombstones and no
//!    slot moves, so open cursors never skip a row or see a removed one.
//! 3. With no cursor open, removal swaps the last row into the freed slot.
//! 4. Closing the last cursor compacts away every tombstone.
//! 5. Destroying a store with open cursors is deferred until the last
//!    cursor closes.
//! 6. Access is single-threaded; callers serialize any cross-thread use.
//!
//! [`Quad`]: dlite_types::Quad

pub mod array;
pub mod config;
pub mod cursor;
pub mod error;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use array::ArrayStore;
pub use config::StoreConfig;
pub use cursor::{Cursor, StoreState};
pub use error::{StoreError, StoreResult};
pub use traits::RelationBackend;
