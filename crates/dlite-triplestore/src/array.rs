use std::collections::HashMap;

use dlite_types::{Quad, QuadPattern};
use tracing::debug;

use crate::config::StoreConfig;
use crate::cursor::{next_owner_tag, Cursor, StoreState};
use crate::error::{StoreError, StoreResult};
use crate::traits::RelationBackend;

/// Array-backed, hash-indexed relation store.
///
/// Quads live in a growable slot array; a `HashMap` maps every live quad id
/// to its slot. A slot is `None` once its quad has been removed while a
/// cursor was open (a tombstone). Tombstones keep slot indices stable for
/// open cursors and are reclaimed when the last cursor closes.
///
/// `len()` counts live quads; `slot_count()` counts occupied slots
/// including tombstones. The two are equal whenever no cursor is open.
pub struct ArrayStore {
    owner: u64,
    slots: Vec<Option<Quad>>,
    index: HashMap<String, usize>,
    length: usize,
    open_cursors: usize,
    pending_destroy: bool,
    destroyed: bool,
    config: StoreConfig,
}

impl ArrayStore {
    /// Create a new empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Number of occupied slots, tombstones included.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots allocated.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of removed rows awaiting compaction.
    pub fn tombstones(&self) -> usize {
        self.slots.len() - self.length
    }

    fn ensure_live(&self) -> StoreResult<()> {
        if self.destroyed || self.pending_destroy {
            return Err(StoreError::Destroyed);
        }
        Ok(())
    }

    fn check_owner(&self, cursor: &Cursor) -> StoreResult<()> {
        if cursor.owner() != self.owner {
            return Err(StoreError::ForeignCursor);
        }
        Ok(())
    }

    /// Make room for `additional` more slots, growing in whole chunks.
    fn reserve_chunks(&mut self, additional: usize) {
        let needed = self.slots.len() + additional;
        let capacity = self.slots.capacity();
        if capacity >= needed {
            return;
        }
        let chunk = self.config.effective_chunk_size();
        let chunks = (needed - capacity).div_ceil(chunk);
        let target = capacity + chunks * chunk;
        self.slots.reserve_exact(target - self.slots.len());
    }

    fn push(&mut self, quad: Quad) -> bool {
        if self.index.contains_key(quad.id()) {
            return false;
        }
        self.index.insert(quad.id().to_string(), self.slots.len());
        self.slots.push(Some(quad));
        self.length += 1;
        true
    }

    /// Remove the quad in `slot`. With no open cursor the last slot is
    /// swapped into its place; otherwise the slot becomes a tombstone.
    fn remove_slot(&mut self, slot: usize) -> bool {
        let Some(quad) = self.slots.get_mut(slot).and_then(|s| s.take()) else {
            return false;
        };
        self.index.remove(quad.id());
        self.length -= 1;
        if self.open_cursors == 0 {
            self.swap_out(slot);
        }
        true
    }

    /// Swap-remove `slot` and re-index the quad that moved into it.
    fn swap_out(&mut self, slot: usize) {
        self.slots.swap_remove(slot);
        if let Some(Some(moved)) = self.slots.get(slot) {
            self.index.insert(moved.id().to_string(), slot);
        }
    }

    /// Reclaim every tombstone. Only valid with no open cursor.
    fn compact(&mut self) {
        let before = self.slots.len();
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        let mut i = self.slots.len();
        while i > 0 {
            i -= 1;
            if self.slots[i].is_none() {
                self.swap_out(i);
            }
        }
        debug_assert_eq!(self.slots.len(), self.length);
        self.shrink();
        debug!(
            reclaimed = before - self.slots.len(),
            len = self.length,
            "relation store compacted"
        );
    }

    /// Give memory back once the array has grown far beyond `len`.
    fn shrink(&mut self) {
        let chunk = self.config.effective_chunk_size();
        if self.slots.capacity() > self.length + chunk {
            self.slots.shrink_to(self.length.next_multiple_of(chunk));
        }
    }

    fn release(&mut self) {
        self.slots = Vec::new();
        self.index = HashMap::new();
        self.length = 0;
        self.pending_destroy = false;
        self.destroyed = true;
    }

    fn live(&self) -> impl Iterator<Item = &Quad> {
        self.slots.iter().flatten()
    }
}

impl Default for ArrayStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationBackend for ArrayStore {
    fn with_config(config: StoreConfig) -> Self {
        Self {
            owner: next_owner_tag(),
            slots: Vec::new(),
            index: HashMap::new(),
            length: 0,
            open_cursors: 0,
            pending_destroy: false,
            destroyed: false,
            config,
        }
    }

    fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn len(&self) -> usize {
        self.length
    }

    fn state(&self) -> StoreState {
        if self.destroyed {
            StoreState::Destroyed
        } else if self.pending_destroy {
            StoreState::PendingDestroy
        } else if self.open_cursors == 0 {
            StoreState::Active
        } else if self.slots.len() > self.length {
            StoreState::IteratingWithTombstones
        } else {
            StoreState::Iterating
        }
    }

    fn open_cursors(&self) -> usize {
        self.open_cursors
    }

    fn add(&mut self, quad: Quad) -> StoreResult<bool> {
        self.ensure_live()?;
        if self.index.contains_key(quad.id()) {
            return Ok(false);
        }
        self.reserve_chunks(1);
        Ok(self.push(quad))
    }

    fn add_batch(&mut self, quads: Vec<Quad>) -> StoreResult<usize> {
        self.ensure_live()?;
        self.reserve_chunks(quads.len());
        let mut added = 0;
        for quad in quads {
            if self.push(quad) {
                added += 1;
            }
        }
        Ok(added)
    }

    fn remove(&mut self, pattern: &QuadPattern<'_>) -> StoreResult<usize> {
        self.ensure_live()?;
        // Walk backwards so a swap only ever moves an already-visited row.
        let mut removed = 0;
        let mut i = self.slots.len();
        while i > 0 {
            i -= 1;
            let matched = matches!(&self.slots[i], Some(quad) if pattern.matches(quad));
            if matched && self.remove_slot(i) {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn remove_by_id(&mut self, id: &str) -> StoreResult<bool> {
        self.ensure_live()?;
        match self.index.get(id).copied() {
            Some(slot) => Ok(self.remove_slot(slot)),
            None => Ok(false),
        }
    }

    fn clear(&mut self) {
        self.index.clear();
        self.length = 0;
        if self.open_cursors == 0 {
            self.slots.clear();
            self.shrink();
        } else {
            for slot in &mut self.slots {
                *slot = None;
            }
        }
    }

    fn get(&self, id: &str) -> Option<&Quad> {
        let slot = *self.index.get(id)?;
        self.slots.get(slot)?.as_ref()
    }

    fn find_first(&self, pattern: &QuadPattern<'_>) -> Option<&Quad> {
        self.live().find(|quad| pattern.matches(quad))
    }

    fn open_cursor(&mut self) -> StoreResult<Cursor> {
        self.ensure_live()?;
        self.open_cursors += 1;
        Ok(Cursor::new(self.owner))
    }

    fn next(&self, cursor: &mut Cursor, pattern: &QuadPattern<'_>) -> Option<&Quad> {
        if cursor.owner() != self.owner {
            return None;
        }
        while cursor.position() < self.slots.len() {
            let slot = cursor.position();
            cursor.set_position(slot + 1);
            if let Some(quad) = &self.slots[slot] {
                if pattern.matches(quad) {
                    return Some(quad);
                }
            }
        }
        None
    }

    fn poll(&self, cursor: &mut Cursor) -> Option<&Quad> {
        if cursor.owner() != self.owner {
            return None;
        }
        while cursor.position() < self.slots.len() {
            if let Some(quad) = &self.slots[cursor.position()] {
                return Some(quad);
            }
            cursor.set_position(cursor.position() + 1);
        }
        None
    }

    fn close_cursor(&mut self, cursor: Cursor) -> StoreResult<()> {
        self.check_owner(&cursor)?;
        if self.open_cursors == 0 {
            return Err(StoreError::NoOpenCursor);
        }
        self.open_cursors -= 1;
        if self.open_cursors > 0 {
            return Ok(());
        }
        if self.pending_destroy {
            debug!("last cursor closed, completing deferred destroy");
            self.release();
        } else if self.slots.len() > self.length {
            self.compact();
        }
        Ok(())
    }

    fn destroy(&mut self) -> StoreState {
        if self.destroyed {
            return StoreState::Destroyed;
        }
        self.clear();
        if self.open_cursors == 0 {
            self.release();
        } else {
            debug!(
                open_cursors = self.open_cursors,
                "destroy deferred until cursors close"
            );
            self.pending_destroy = true;
        }
        self.state()
    }

    fn quads(&self) -> Vec<Quad> {
        self.live().cloned().collect()
    }
}

impl std::fmt::Debug for ArrayStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayStore")
            .field("length", &self.length)
            .field("slots", &self.slots.len())
            .field("open_cursors", &self.open_cursors)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use proptest::prelude::*;

    fn quad(s: &str, p: &str, o: &str) -> Quad {
        Quad::new(s, p, o, None)
    }

    fn store_with(quads: &[(&str, &str, &str)]) -> ArrayStore {
        let mut store = ArrayStore::new();
        for (s, p, o) in quads {
            store.insert(s, p, o, None).unwrap();
        }
        store
    }

    fn drain(store: &ArrayStore, cursor: &mut Cursor, pattern: &QuadPattern<'_>) -> Vec<Quad> {
        let mut out = Vec::new();
        while let Some(q) = store.next(cursor, pattern) {
            out.push(q.clone());
        }
        out
    }

    // -----------------------------------------------------------------------
    // Add / dedup
    // -----------------------------------------------------------------------

    #[test]
    fn add_is_idempotent() {
        let mut store = ArrayStore::new();
        assert!(store.add(quad("s", "p", "o")).unwrap());
        assert!(!store.add(quad("s", "p", "o")).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.slot_count(), 1);
    }

    #[test]
    fn datatype_distinguishes_quads() {
        let mut store = ArrayStore::new();
        store.insert("s", "p", "1", None).unwrap();
        store.insert("s", "p", "1", Some("xsd:int")).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn add_batch_dedups_within_batch() {
        let mut store = ArrayStore::new();
        let added = store
            .add_batch(vec![quad("a", "p", "o"), quad("b", "p", "o"), quad("a", "p", "o")])
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn grows_in_chunks() {
        let mut store = ArrayStore::with_config(StoreConfig {
            chunk_size: 4,
            id_namespace: None,
        });
        store.insert("a", "p", "o", None).unwrap();
        assert_eq!(store.capacity(), 4);
        for i in 0..4 {
            store.insert(&format!("s{i}"), "p", "o", None).unwrap();
        }
        assert_eq!(store.capacity(), 8);
    }

    #[test]
    fn batch_reserves_once() {
        let mut store = ArrayStore::with_config(StoreConfig {
            chunk_size: 4,
            id_namespace: None,
        });
        let quads: Vec<Quad> = (0..9).map(|i| quad(&format!("s{i}"), "p", "o")).collect();
        store.add_batch(quads).unwrap();
        assert_eq!(store.capacity(), 12);
    }

    #[test]
    fn exact_chunk_multiple_reserves_no_spare_chunk() {
        let mut store = ArrayStore::with_config(StoreConfig {
            chunk_size: 4,
            id_namespace: None,
        });
        let quads: Vec<Quad> = (0..4).map(|i| quad(&format!("s{i}"), "p", "o")).collect();
        store.add_batch(quads).unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(store.capacity(), 4);

        let more: Vec<Quad> = (4..12).map(|i| quad(&format!("s{i}"), "p", "o")).collect();
        store.add_batch(more).unwrap();
        assert_eq!(store.capacity(), 12);
    }

    #[test]
    fn insert_uses_namespace() {
        let mut store = ArrayStore::with_config(StoreConfig::with_namespace("ex:"));
        store.insert("s", "p", "o", None).unwrap();
        let q = store.find_first(&QuadPattern::any()).unwrap();
        assert!(q.id().starts_with("ex:"));
        assert!(store.get(q.id()).is_some());
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    #[test]
    fn find_first_and_get() {
        let store = store_with(&[("a", "p", "1"), ("b", "p", "2"), ("a", "q", "3")]);
        let q = store
            .find_first(&QuadPattern::any().subject("a").predicate("q"))
            .unwrap();
        assert_eq!(q.object(), "3");
        assert_eq!(store.get(q.id()), Some(q));
        assert!(store.find_first(&QuadPattern::any().subject("z")).is_none());
        assert!(store.get("missing").is_none());
    }

    // -----------------------------------------------------------------------
    // Removal without cursors
    // -----------------------------------------------------------------------

    #[test]
    fn wildcard_remove_counts_and_clears() {
        let mut store = store_with(&[
            ("a", "p", "1"),
            ("b", "p", "2"),
            ("a", "q", "3"),
            ("c", "p", "4"),
            ("a", "r", "5"),
        ]);
        let removed = store
            .remove(&QuadPattern::triple(Some("a"), None, None))
            .unwrap();
        assert_eq!(removed, 3);
        assert_eq!(store.len(), 2);
        assert_eq!(store.slot_count(), 2);
        assert!(store.find_first(&QuadPattern::any().subject("a")).is_none());
    }

    #[test]
    fn swap_removal_keeps_index_consistent() {
        let mut store = store_with(&[("a", "p", "1"), ("b", "p", "2"), ("c", "p", "3")]);
        let a_id = quad("a", "p", "1").id().to_string();
        let c_id = quad("c", "p", "3").id().to_string();
        assert!(store.remove_by_id(&a_id).unwrap());
        // "c" was swapped into slot 0; its index entry must follow it.
        assert_eq!(store.get(&c_id).map(Quad::subject), Some("c"));
        assert!(store.remove_by_id(&c_id).unwrap());
        assert_eq!(store.len(), 1);
        assert!(!store.remove_by_id(&c_id).unwrap());
    }

    #[test]
    fn readd_after_remove() {
        let mut store = store_with(&[("a", "p", "1")]);
        store.remove(&QuadPattern::any()).unwrap();
        assert!(store.insert("a", "p", "1", None).unwrap());
        assert_eq!(store.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Cursors
    // -----------------------------------------------------------------------

    #[test]
    fn cursor_visits_in_insertion_order() {
        let mut store = store_with(&[("a", "p", "1"), ("b", "p", "2"), ("c", "p", "3")]);
        let mut cursor = store.open_cursor().unwrap();
        let subjects: Vec<String> = drain(&store, &mut cursor, &QuadPattern::any())
            .iter()
            .map(|q| q.subject().to_string())
            .collect();
        assert_eq!(subjects, vec!["a", "b", "c"]);
        store.close_cursor(cursor).unwrap();
    }

    #[test]
    fn cursor_with_pattern() {
        let mut store = store_with(&[("a", "p", "1"), ("b", "q", "2"), ("c", "p", "3")]);
        let mut cursor = store.open_cursor().unwrap();
        let found = drain(&store, &mut cursor, &QuadPattern::any().predicate("p"));
        assert_eq!(found.len(), 2);
        store.close_cursor(cursor).unwrap();
    }

    #[test]
    fn removal_under_cursor_is_deferred() {
        let mut store = store_with(&[("a", "p", "1"), ("b", "p", "2"), ("c", "p", "3")]);
        let mut cursor = store.open_cursor().unwrap();
        assert_eq!(store.state(), StoreState::Iterating);

        let first = store.next(&mut cursor, &QuadPattern::any()).cloned().unwrap();
        assert_eq!(first.subject(), "a");
        store.remove_by_id(first.id()).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.slot_count(), 3);
        assert_eq!(store.state(), StoreState::IteratingWithTombstones);

        let rest: Vec<String> = drain(&store, &mut cursor, &QuadPattern::any())
            .iter()
            .map(|q| q.subject().to_string())
            .collect();
        assert_eq!(rest, vec!["b", "c"]);

        store.close_cursor(cursor).unwrap();
        assert_eq!(store.state(), StoreState::Active);
        assert_eq!(store.slot_count(), store.len());
    }

    #[test]
    fn removed_rows_are_skipped() {
        let mut store = store_with(&[("a", "p", "1"), ("b", "p", "2"), ("c", "p", "3")]);
        let mut cursor = store.open_cursor().unwrap();
        store.remove(&QuadPattern::any().subject("b")).unwrap();
        let subjects: Vec<String> = drain(&store, &mut cursor, &QuadPattern::any())
            .iter()
            .map(|q| q.subject().to_string())
            .collect();
        assert_eq!(subjects, vec!["a", "c"]);
        store.close_cursor(cursor).unwrap();
    }

    #[test]
    fn nested_cursors_compact_on_last_close() {
        let mut store = store_with(&[("a", "p", "1"), ("b", "p", "2"), ("c", "p", "3")]);
        let outer = store.open_cursor().unwrap();
        let inner = store.open_cursor().unwrap();
        store.remove(&QuadPattern::any().subject("a")).unwrap();

        store.close_cursor(inner).unwrap();
        assert_eq!(store.tombstones(), 1);
        assert_eq!(store.open_cursors(), 1);

        store.close_cursor(outer).unwrap();
        assert_eq!(store.tombstones(), 0);
        assert_eq!(store.len(), 2);
        // Index still resolves every survivor after compaction.
        for q in store.quads() {
            assert_eq!(store.get(q.id()), Some(&q));
        }
    }

    #[test]
    fn quads_added_during_scan_are_visited() {
        let mut store = store_with(&[("a", "p", "1")]);
        let mut cursor = store.open_cursor().unwrap();
        assert!(store.next(&mut cursor, &QuadPattern::any()).is_some());
        store.insert("b", "p", "2", None).unwrap();
        assert_eq!(
            store.next(&mut cursor, &QuadPattern::any()).map(Quad::subject),
            Some("b")
        );
        store.close_cursor(cursor).unwrap();
    }

    #[test]
    fn poll_does_not_advance() {
        let mut store = store_with(&[("a", "p", "1"), ("b", "p", "2")]);
        let mut cursor = store.open_cursor().unwrap();
        store.remove(&QuadPattern::any().subject("a")).unwrap();
        assert_eq!(store.poll(&mut cursor).map(Quad::subject), Some("b"));
        assert_eq!(store.poll(&mut cursor).map(Quad::subject), Some("b"));
        assert_eq!(
            store.next(&mut cursor, &QuadPattern::any()).map(Quad::subject),
            Some("b")
        );
        assert!(store.poll(&mut cursor).is_none());
        cursor.reset();
        assert_eq!(store.poll(&mut cursor).map(Quad::subject), Some("b"));
        store.close_cursor(cursor).unwrap();
    }

    #[test]
    fn foreign_cursor_is_rejected() {
        let mut a = store_with(&[("a", "p", "1")]);
        let mut b = store_with(&[("b", "p", "2")]);
        let mut cursor = a.open_cursor().unwrap();
        assert!(b.next(&mut cursor, &QuadPattern::any()).is_none());
        assert_eq!(b.close_cursor(cursor), Err(StoreError::ForeignCursor));
        assert_eq!(a.open_cursors(), 1);
    }

    #[test]
    fn close_without_open_fails() {
        let mut store = ArrayStore::new();
        let cursor = Cursor::new(store.owner);
        assert_eq!(store.close_cursor(cursor), Err(StoreError::NoOpenCursor));
    }

    // -----------------------------------------------------------------------
    // Clear / destroy
    // -----------------------------------------------------------------------

    #[test]
    fn clear_preserves_open_cursor_count() {
        let mut store = store_with(&[("a", "p", "1"), ("b", "p", "2")]);
        let mut cursor = store.open_cursor().unwrap();
        store.clear();
        assert_eq!(store.len(), 0);
        assert_eq!(store.open_cursors(), 1);
        assert!(store.next(&mut cursor, &QuadPattern::any()).is_none());
        store.close_cursor(cursor).unwrap();
        assert_eq!(store.slot_count(), 0);
        assert_eq!(store.state(), StoreState::Active);
    }

    #[test]
    fn destroy_without_cursors_is_immediate() {
        let mut store = store_with(&[("a", "p", "1")]);
        assert_eq!(store.destroy(), StoreState::Destroyed);
        assert_eq!(store.len(), 0);
        assert_eq!(store.insert("b", "p", "2", None), Err(StoreError::Destroyed));
        assert_eq!(store.open_cursor(), Err(StoreError::Destroyed));
    }

    #[test]
    fn destroy_with_cursor_is_deferred() {
        let mut store = store_with(&[("a", "p", "1"), ("b", "p", "2")]);
        let mut cursor = store.open_cursor().unwrap();
        assert_eq!(store.destroy(), StoreState::PendingDestroy);
        assert!(store.next(&mut cursor, &QuadPattern::any()).is_none());
        assert_eq!(store.insert("c", "p", "3", None), Err(StoreError::Destroyed));
        store.close_cursor(cursor).unwrap();
        assert_eq!(store.state(), StoreState::Destroyed);
        assert_eq!(store.capacity(), 0);
    }

    #[test]
    fn compaction_shrinks_oversized_array() {
        let mut store = ArrayStore::with_config(StoreConfig {
            chunk_size: 4,
            id_namespace: None,
        });
        for i in 0..20 {
            store.insert(&format!("s{i}"), "p", "o", None).unwrap();
        }
        let cursor = store.open_cursor().unwrap();
        store.remove(&QuadPattern::any().predicate("p")).unwrap();
        store.insert("keep", "p", "o", None).unwrap();
        store.close_cursor(cursor).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.capacity() <= 4 + 4);
    }

    #[test]
    fn debug_format() {
        let store = store_with(&[("a", "p", "1")]);
        let debug = format!("{store:?}");
        assert!(debug.contains("ArrayStore"));
        assert!(debug.contains("open_cursors"));
    }

    // -----------------------------------------------------------------------
    // Iterator safety under arbitrary interleavings
    // -----------------------------------------------------------------------

    #[derive(Clone, Debug)]
    enum Op {
        Next,
        Remove(usize),
        Add(usize),
        RemoveSubject(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Next),
            2 => (0usize..24).prop_map(Op::Remove),
            1 => (0usize..24).prop_map(Op::Add),
            1 => (0usize..24).prop_map(Op::RemoveSubject),
        ]
    }

    fn subject_of(i: usize) -> String {
        format!("s{i}")
    }

    proptest! {
        #[test]
        fn cursor_is_safe_under_mutation(
            initial in 0usize..16,
            ops in proptest::collection::vec(op_strategy(), 0..64),
        ) {
            let mut store = ArrayStore::with_config(StoreConfig { chunk_size: 3, id_namespace: None });
            let mut live: HashSet<String> = HashSet::new();
            for i in 0..initial {
                store.insert(&subject_of(i), "p", "o", None).unwrap();
                live.insert(subject_of(i));
            }
            let at_open = live.clone();
            let mut touched: HashSet<String> = HashSet::new();
            let mut seen: HashSet<String> = HashSet::new();

            let mut cursor = store.open_cursor().unwrap();
            for op in &ops {
                match op {
                    Op::Next => {
                        if let Some(q) = store.next(&mut cursor, &QuadPattern::any()) {
                            prop_assert!(live.contains(q.subject()));
                            seen.insert(q.subject().to_string());
                        }
                    }
                    Op::Remove(i) => {
                        let id = Quad::new(subject_of(*i), "p", "o", None).id().to_string();
                        let existed = live.remove(&subject_of(*i));
                        prop_assert_eq!(store.remove_by_id(&id).unwrap(), existed);
                        touched.insert(subject_of(*i));
                    }
                    Op::RemoveSubject(i) => {
                        let subject = subject_of(*i);
                        let n = store.remove(&QuadPattern::any().subject(&subject)).unwrap();
                        prop_assert_eq!(n, usize::from(live.remove(&subject)));
                        touched.insert(subject);
                    }
                    Op::Add(i) => {
                        store.insert(&subject_of(*i), "p", "o", None).unwrap();
                        live.insert(subject_of(*i));
                    }
                }
                prop_assert_eq!(store.len(), live.len());
                prop_assert!(store.len() <= store.slot_count());
            }
            while let Some(q) = store.next(&mut cursor, &QuadPattern::any()) {
                prop_assert!(live.contains(q.subject()));
                seen.insert(q.subject().to_string());
            }
            for subject in at_open.difference(&touched) {
                prop_assert!(seen.contains(subject), "cursor skipped {}", subject);
            }

            store.close_cursor(cursor).unwrap();
            prop_assert_eq!(store.slot_count(), store.len());
            prop_assert_eq!(store.state(), StoreState::Active);
            for q in store.quads() {
                prop_assert_eq!(store.get(q.id()), Some(&q));
            }
        }
    }
}
