/// Errors from relation store operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// No live quad has the requested id.
    #[error("no such quad id: {0}")]
    NoSuchQuad(String),

    /// The store has been destroyed, or destruction is pending on open cursors.
    #[error("relation store has been destroyed")]
    Destroyed,

    /// A cursor was handed to a store that did not open it.
    #[error("cursor does not belong to this store")]
    ForeignCursor,

    /// `close_cursor` was called with no cursor open.
    #[error("no open cursor to close")]
    NoOpenCursor,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
