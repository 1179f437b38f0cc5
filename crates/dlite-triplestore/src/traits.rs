use dlite_types::{Quad, QuadPattern};

use crate::config::StoreConfig;
use crate::cursor::{Cursor, StoreState};
use crate::error::StoreResult;

/// Storage backend for the relations of one collection.
///
/// All implementations must satisfy these invariants:
/// - Adding a quad whose id is already present is a no-op (idempotent).
/// - `None` pattern fields are wildcards; removal and lookup honour the
///   same matching rules as [`QuadPattern::matches`].
/// - While any cursor is open, removed quads are never returned by `next`
///   and no quad present when a cursor was opened is skipped by it.
/// - Once the last cursor closes, every removed row has been reclaimed.
/// - `destroy` with open cursors is deferred until the last cursor closes.
///
/// Backends are driven from a single thread and need not be `Send` or
/// `Sync`.
pub trait RelationBackend {
    /// Create an empty store.
    fn with_config(config: StoreConfig) -> Self
    where
        Self: Sized;

    /// The configuration the store was created with.
    fn config(&self) -> &StoreConfig;

    /// Number of live quads.
    fn len(&self) -> usize;

    /// Returns `true` if the store holds no live quads.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current lifecycle state.
    fn state(&self) -> StoreState;

    /// Number of cursors currently open.
    fn open_cursors(&self) -> usize;

    /// Add a quad. Returns `Ok(false)` if a quad with the same id exists.
    fn add(&mut self, quad: Quad) -> StoreResult<bool>;

    /// Add many quads at once. Returns the number actually inserted.
    ///
    /// Default implementation calls `add()` for each quad. Backends may
    /// override to size their storage once.
    fn add_batch(&mut self, quads: Vec<Quad>) -> StoreResult<usize> {
        let mut added = 0;
        for quad in quads {
            if self.add(quad)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Build a quad with the configured id namespace and add it.
    fn insert(
        &mut self,
        subject: &str,
        predicate: &str,
        object: &str,
        datatype: Option<&str>,
    ) -> StoreResult<bool> {
        let quad = Quad::with_namespace(
            self.config().id_namespace.as_deref(),
            subject,
            predicate,
            object,
            datatype,
        );
        self.add(quad)
    }

    /// Remove every quad matching `pattern`. Returns the number removed.
    fn remove(&mut self, pattern: &QuadPattern<'_>) -> StoreResult<usize>;

    /// Remove the quad with the given id. Returns `Ok(false)` if absent.
    fn remove_by_id(&mut self, id: &str) -> StoreResult<bool>;

    /// Remove every quad, keeping the open-cursor count intact.
    fn clear(&mut self);

    /// Look up a live quad by id.
    fn get(&self, id: &str) -> Option<&Quad>;

    /// First live quad matching `pattern`.
    fn find_first(&self, pattern: &QuadPattern<'_>) -> Option<&Quad>;

    /// Open a cursor positioned before the first quad.
    fn open_cursor(&mut self) -> StoreResult<Cursor>;

    /// Advance `cursor` to the next live quad matching `pattern`.
    fn next(&self, cursor: &mut Cursor, pattern: &QuadPattern<'_>) -> Option<&Quad>;

    /// Skip removed rows and return the quad under `cursor` without
    /// consuming it.
    fn poll(&self, cursor: &mut Cursor) -> Option<&Quad>;

    /// Close `cursor`. Closing the last cursor compacts the store or
    /// completes a pending destroy.
    fn close_cursor(&mut self, cursor: Cursor) -> StoreResult<()>;

    /// Release the store. Deferred while cursors are open.
    fn destroy(&mut self) -> StoreState;

    /// Snapshot of every live quad.
    fn quads(&self) -> Vec<Quad>;
}
