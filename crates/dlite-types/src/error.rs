use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid digest '{value}': {reason}")]
    InvalidDigest { value: String, reason: String },

    #[error("invalid instance id: {0}")]
    InvalidId(String),
}
