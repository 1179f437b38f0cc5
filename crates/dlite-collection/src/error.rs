//! Error types for the collection crate.

use dlite_instance::InstanceError;
use dlite_triplestore::StoreError;

/// Errors that can occur during collection operations.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// No member or relation matches the requested label or id.
    #[error("not found in collection: {0}")]
    NotFound(String),

    /// A member with this label already exists.
    #[error("instance with label '{0}' is already in the collection")]
    DuplicateLabel(String),

    /// A collection has exactly one dimension.
    #[error("dimension index {index} out of range (collection has {ndims})")]
    IndexOutOfRange { index: usize, ndims: usize },

    /// Members that could not be resolved while loading relations.
    #[error("{} member(s) could not be resolved: {}", labels.len(), labels.join(", "))]
    UnresolvedMembers { labels: Vec<String> },

    /// The collection transitively contains itself.
    #[error("collection {uuid} transitively contains itself")]
    HashCycle { uuid: String },

    /// A serialized relation row is malformed.
    #[error("invalid relation: {0}")]
    InvalidRelation(String),

    /// A serialized collection document is malformed.
    #[error("invalid collection document: {0}")]
    InvalidDocument(String),

    /// Relation store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Instance collaborator failed.
    #[error("instance error: {0}")]
    Instance(#[from] InstanceError),

    /// Invalid identifier.
    #[error("invalid id: {0}")]
    InvalidId(#[from] dlite_types::TypeError),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for collection results.
pub type CollectionResult<T> = Result<T, CollectionError>;
