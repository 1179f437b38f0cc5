//! Cursor handles and the store lifecycle states.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique owner tag for a new store.
///
/// Backends stamp every cursor they open with their tag so that a cursor
/// handed to the wrong store is rejected.
pub fn next_owner_tag() -> u64 {
    NEXT_OWNER.fetch_add(1, Ordering::Relaxed)
}

/// A scan position over a relation store.
///
/// A cursor does not borrow the store: it is a plain position that the store
/// advances in `next`. This is what lets the owner mutate the store between
/// two calls to `next`. Every cursor must be handed back through
/// `close_cursor`; a dropped cursor keeps the store in deferred-compaction
/// mode for the rest of its life.
#[must_use = "cursors must be closed with `close_cursor`"]
#[derive(Debug, PartialEq, Eq)]
pub struct Cursor {
    owner: u64,
    position: usize,
}

impl Cursor {
    /// A cursor at position 0 for the store tagged `owner`.
    pub fn new(owner: u64) -> Self {
        Self { owner, position: 0 }
    }

    /// Tag of the store that opened this cursor.
    pub fn owner(&self) -> u64 {
        self.owner
    }

    /// Index of the next slot to visit.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Move back to the first slot.
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

/// Lifecycle state of a relation store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreState {
    /// No open cursors, fully compacted.
    Active,
    /// At least one open cursor, no tombstones yet.
    Iterating,
    /// At least one open cursor and some removed rows awaiting compaction.
    IteratingWithTombstones,
    /// Destroy was requested while cursors were open.
    PendingDestroy,
    /// Storage released; every mutation fails.
    Destroyed,
}

impl StoreState {
    /// Returns `true` if the store accepts mutations.
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::PendingDestroy | Self::Destroyed)
    }
}
