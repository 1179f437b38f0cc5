//! Error types for instance operations.

use thiserror::Error;

/// Errors that can occur in instance collaborators.
#[derive(Debug, Error)]
pub enum InstanceError {
    /// No live instance has this uuid or URI.
    #[error("instance not found: {id}")]
    NotFound { id: String },

    /// The instance has no property with this name.
    #[error("instance {instance} has no property '{name}'")]
    UnknownProperty { instance: String, name: String },

    /// A property value does not have the expected shape.
    #[error("invalid value for property '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    /// Two different instances claim the same uuid.
    #[error("another instance is already registered with uuid {uuid}")]
    UuidConflict { uuid: String },

    /// No mapping exists to the requested metadata.
    #[error("cannot map instance {instance} to {meta}")]
    NoMapping { instance: String, meta: String },

    /// Content hashing failed.
    #[error("cannot hash instance {instance}: {reason}")]
    Hash { instance: String, reason: String },

    /// The instance was reached again while its own hash was being computed.
    #[error("instance {uuid} transitively contains itself")]
    HashCycle { uuid: String },

    /// Invalid identifier.
    #[error("invalid id: {0}")]
    InvalidId(#[from] dlite_types::TypeError),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience type alias for instance operations.
pub type Result<T> = std::result::Result<T, InstanceError>;
