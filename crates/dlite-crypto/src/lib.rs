//! Content hashing for DLite.
//!
//! Provides domain-separated BLAKE3 hashing of instances and collections,
//! both one-shot ([`ContentHasher::hash`]) and incremental
//! ([`DigestStream`]) for digests built field by field.
//!
//! All crypto operations wrap established libraries.

pub mod hasher;

pub use hasher::{ContentHasher, DigestStream};
