//! The [`Collection`] type: membership, lookup and iteration.
//!
//! A collection records its members as relations in a single relation
//! store and holds one reference count on every member it tracks. All
//! methods take `&self`; the store sits behind a `RefCell` and is never
//! borrowed across a call into a collaborator, so members may be added or
//! removed while an iterator over the collection is alive.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use dlite_instance::{
    Instance, InstanceError, InstanceRef, InstanceRegistry, MappingResolver, OwnedInstance,
};
use dlite_triplestore::{ArrayStore, Cursor, RelationBackend, StoreError, StoreResult, StoreState};
use dlite_types::{derive_uuid, Digest, InstanceId, Quad, QuadPattern};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::CollectionConfig;
use crate::error::{CollectionError, CollectionResult};
use crate::persist::{relations_from_value, relations_to_value};
use crate::vocab::{
    COLLECTION_META_URI, HAS_DIMMAP, HAS_HASH, HAS_META, HAS_UUID, INSTANCE, IS_A, MAPS_TO,
    RELATIONS_PROPERTY,
};

/// Identity and content hash of the previous version of a collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub uuid: String,
    /// Content hash of the parent, persisted as hex.
    pub hash: Digest,
}

/// A reference-counted aggregate of instances and the relations between
/// them.
///
/// Every member is recorded by three bookkeeping relations:
/// `(label, _is-a, Instance)`, `(label, _has-uuid, uuid)` and
/// `(label, _has-meta, meta-uri)`. Members are resolved through the
/// injected [`InstanceRegistry`].
pub struct Collection<B: RelationBackend = ArrayStore> {
    pub(crate) id: InstanceId,
    refcount: Cell<usize>,
    pub(crate) store: RefCell<B>,
    pub(crate) registry: Rc<dyn InstanceRegistry>,
    mapper: Option<Rc<dyn MappingResolver>>,
    pub(crate) parent: RefCell<Option<ParentRef>>,
    nrelations: Cell<usize>,
    pub(crate) hashing: Cell<bool>,
    deinitialized: Cell<bool>,
    config: CollectionConfig,
}

impl Collection<ArrayStore> {
    /// Create an empty collection over an [`ArrayStore`].
    ///
    /// `id` defaults to a fresh random uuid; a non-uuid id becomes the
    /// collection URI.
    pub fn create(id: Option<&str>, registry: Rc<dyn InstanceRegistry>) -> CollectionResult<Self> {
        Self::with_config(id, registry, CollectionConfig::default())
    }
}

impl<B: RelationBackend> Collection<B> {
    /// Create an empty collection over backend `B`.
    pub fn with_config(
        id: Option<&str>,
        registry: Rc<dyn InstanceRegistry>,
        config: CollectionConfig,
    ) -> CollectionResult<Self> {
        Ok(Self::from_parts(derive_uuid(id)?, registry, config))
    }

    pub(crate) fn from_parts(
        id: InstanceId,
        registry: Rc<dyn InstanceRegistry>,
        config: CollectionConfig,
    ) -> Self {
        let store = B::with_config(config.store.clone());
        debug!(uuid = %id.uuid, "collection created");
        Self {
            id,
            refcount: Cell::new(1),
            store: RefCell::new(store),
            registry,
            mapper: None,
            parent: RefCell::new(None),
            nrelations: Cell::new(0),
            hashing: Cell::new(false),
            deinitialized: Cell::new(false),
            config,
        }
    }

    /// Use `mapper` to cast members in [`get_new`](Self::get_new).
    pub fn with_mapper(mut self, mapper: Rc<dyn MappingResolver>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn registry(&self) -> &Rc<dyn InstanceRegistry> {
        &self.registry
    }

    /// Size of the `nrelations` dimension.
    pub fn nrelations(&self) -> usize {
        self.nrelations.get()
    }

    /// Size of dimension `index`. A collection has exactly one dimension.
    pub fn dimension_size(&self, index: usize) -> CollectionResult<usize> {
        match index {
            0 => Ok(self.nrelations()),
            _ => Err(CollectionError::IndexOutOfRange { index, ndims: 1 }),
        }
    }

    /// Lifecycle state of the underlying store.
    pub fn store_state(&self) -> StoreState {
        self.store.borrow().state()
    }

    /// Returns `true` once the member references have been released.
    pub fn is_deinitialized(&self) -> bool {
        self.deinitialized.get()
    }

    pub(crate) fn ensure_live(&self) -> CollectionResult<()> {
        if self.deinitialized.get() {
            return Err(StoreError::Destroyed.into());
        }
        Ok(())
    }

    pub(crate) fn sync(&self) {
        self.nrelations.set(self.store.borrow().len());
    }

    // ---- Relations ----

    /// Add the relation `(s, p, o, d)`. Returns `false` if already present.
    ///
    /// A label carries at most one `_has-uuid` relation; adding a second
    /// one with another object fails with [`CollectionError::InvalidRelation`].
    pub fn add_relation(
        &self,
        subject: &str,
        predicate: &str,
        object: &str,
        datatype: Option<&str>,
    ) -> CollectionResult<bool> {
        self.ensure_live()?;
        if predicate == HAS_UUID {
            if let Some(existing) = self.member_uuid(subject) {
                if existing != object {
                    return Err(CollectionError::InvalidRelation(format!(
                        "label '{subject}' already refers to {existing}"
                    )));
                }
            }
        }
        let added = self
            .store
            .borrow_mut()
            .insert(subject, predicate, object, datatype)?;
        self.sync();
        Ok(added)
    }

    /// Remove every relation matching `pattern`. Returns the number removed.
    pub fn remove_relations(&self, pattern: &QuadPattern<'_>) -> CollectionResult<usize> {
        self.ensure_live()?;
        let removed = self.store.borrow_mut().remove(pattern)?;
        self.sync();
        Ok(removed)
    }

    pub fn find_first(&self, pattern: &QuadPattern<'_>) -> Option<Quad> {
        self.store.borrow().find_first(pattern).cloned()
    }

    /// Open a cursor for [`find`](Self::find). Must be handed back to
    /// [`close_cursor`](Self::close_cursor).
    pub fn open_cursor(&self) -> CollectionResult<Cursor> {
        Ok(self.store.borrow_mut().open_cursor()?)
    }

    /// Next relation after `cursor` matching `pattern`.
    pub fn find(&self, cursor: &mut Cursor, pattern: &QuadPattern<'_>) -> Option<Quad> {
        self.store.borrow().next(cursor, pattern).cloned()
    }

    pub fn close_cursor(&self, cursor: Cursor) -> CollectionResult<()> {
        self.store.borrow_mut().close_cursor(cursor)?;
        self.sync();
        Ok(())
    }

    /// Every relation matching `pattern`, in store order.
    pub fn find_all(&self, pattern: &QuadPattern<'_>) -> CollectionResult<Vec<Quad>> {
        let mut cursor = self.open_cursor()?;
        let mut found = Vec::new();
        while let Some(quad) = self.find(&mut cursor, pattern) {
            found.push(quad);
        }
        self.close_cursor(cursor)?;
        Ok(found)
    }

    /// Snapshot of every relation.
    pub fn relations(&self) -> Vec<Quad> {
        self.store.borrow().quads()
    }

    fn count_matching(&self, pattern: &QuadPattern<'_>) -> usize {
        let mut store = self.store.borrow_mut();
        let Ok(mut cursor) = store.open_cursor() else {
            return 0;
        };
        let mut count = 0;
        while store.next(&mut cursor, pattern).is_some() {
            count += 1;
        }
        if let Err(err) = store.close_cursor(cursor) {
            warn!(%err, "failed to close counting cursor");
        }
        count
    }

    // ---- Members ----

    /// A label is taken by a member or by a bare `_has-uuid` relation.
    fn check_label_free(&self, label: &str) -> CollectionResult<()> {
        if self.has(label) || self.member_uuid(label).is_some() {
            return Err(CollectionError::DuplicateLabel(label.to_string()));
        }
        Ok(())
    }

    /// Add `instance` under `label`, taking over the caller's reference.
    ///
    /// On failure the reference is released with the guard.
    pub fn add_new(&self, label: &str, instance: OwnedInstance) -> CollectionResult<()> {
        self.ensure_live()?;
        self.check_label_free(label)?;
        self.registry.register(Rc::clone(instance.handle()))?;
        let instance = instance.into_inner();
        self.insert_member(label, &instance)
    }

    /// Add `instance` under `label`. The collection takes its own
    /// reference; the caller keeps theirs.
    pub fn add(&self, label: &str, instance: &InstanceRef) -> CollectionResult<()> {
        self.ensure_live()?;
        self.check_label_free(label)?;
        self.registry.register(Rc::clone(instance))?;
        instance.incref();
        self.insert_member(label, instance)
    }

    fn insert_member(&self, label: &str, instance: &InstanceRef) -> CollectionResult<()> {
        {
            let mut store = self.store.borrow_mut();
            store.insert(label, IS_A, INSTANCE, None)?;
            store.insert(label, HAS_UUID, instance.uuid(), None)?;
            store.insert(label, HAS_META, instance.meta_uri(), None)?;
        }
        self.sync();
        debug!(
            collection = %self.id.uuid,
            label,
            member = instance.uuid(),
            "member added"
        );
        Ok(())
    }

    /// Remove the member `label` and release the collection's reference
    /// to it.
    ///
    /// Dimension maps of the label and its cached hash are removed too.
    pub fn remove(&self, label: &str) -> CollectionResult<()> {
        self.ensure_live()?;
        let membership = QuadPattern::any()
            .subject(label)
            .predicate(IS_A)
            .object(INSTANCE);
        if self.store.borrow_mut().remove(&membership)? == 0 {
            return Err(CollectionError::NotFound(format!("label '{label}'")));
        }
        if let Some(uuid) = self.member_uuid(label) {
            self.release_member(label, &uuid);
        }
        {
            let mut store = self.store.borrow_mut();
            let mut cursor = store.open_cursor()?;
            let drained = drain_dimmaps(&mut *store, &mut cursor, label);
            store.close_cursor(cursor)?;
            drained?;
            for predicate in [HAS_UUID, HAS_META, HAS_DIMMAP, HAS_HASH] {
                store.remove(&QuadPattern::any().subject(label).predicate(predicate))?;
            }
        }
        self.sync();
        debug!(collection = %self.id.uuid, label, "member removed");
        Ok(())
    }

    /// Map dimension `inst_dim` of member `label` onto the collection
    /// dimension `coll_dim`.
    pub fn add_dimmap(&self, label: &str, inst_dim: &str, coll_dim: &str) -> CollectionResult<()> {
        self.ensure_live()?;
        if !self.has(label) {
            return Err(CollectionError::NotFound(format!("label '{label}'")));
        }
        {
            let mut store = self.store.borrow_mut();
            let mapping = Quad::with_namespace(
                store.config().id_namespace.as_deref(),
                inst_dim,
                MAPS_TO,
                coll_dim,
                None,
            );
            let id = mapping.id().to_string();
            store.add(mapping)?;
            store.insert(label, HAS_DIMMAP, &id, None)?;
        }
        self.sync();
        Ok(())
    }

    /// Dimension maps of `label` as `(instance dimension, collection
    /// dimension)` pairs.
    pub fn dimmaps(&self, label: &str) -> Vec<(String, String)> {
        let store = self.store.borrow();
        store
            .quads()
            .iter()
            .filter(|q| q.subject() == label && q.predicate() == HAS_DIMMAP)
            .filter_map(|q| store.get(q.object()))
            .map(|m| (m.subject().to_string(), m.object().to_string()))
            .collect()
    }

    /// The uuid `label` refers to. Loaded relations may carry several
    /// `_has-uuid` relations for one label; the first in store order wins.
    pub(crate) fn member_uuid(&self, label: &str) -> Option<String> {
        let pattern = QuadPattern::any().subject(label).predicate(HAS_UUID);
        self.store
            .borrow()
            .find_first(&pattern)
            .map(|q| q.object().to_string())
    }

    fn resolve_member(&self, label: &str, uuid: &str) -> CollectionResult<OwnedInstance> {
        self.registry.resolve(uuid).ok_or_else(|| {
            CollectionError::NotFound(format!("instance {uuid} (label '{label}')"))
        })
    }

    /// Release the collection's reference to a member. The lookup
    /// reference is released when the guard drops.
    fn release_member(&self, label: &str, uuid: &str) -> bool {
        match self.registry.resolve(uuid) {
            Some(member) => {
                member.decref();
                true
            }
            None => {
                warn!(
                    collection = %self.id.uuid,
                    label,
                    uuid,
                    "cannot resolve member, reference not released"
                );
                false
            }
        }
    }

    /// `(label, uuid)` of every `_has-uuid` relation.
    pub(crate) fn member_pairs(&self) -> StoreResult<Vec<(String, String)>> {
        let pattern = QuadPattern::any().predicate(HAS_UUID);
        let mut store = self.store.borrow_mut();
        let mut cursor = store.open_cursor()?;
        let mut pairs = Vec::new();
        while let Some(quad) = store.next(&mut cursor, &pattern) {
            pairs.push((quad.subject().to_string(), quad.object().to_string()));
        }
        store.close_cursor(cursor)?;
        Ok(pairs)
    }

    /// Release every member reference. Returns the labels that could not
    /// be resolved.
    pub(crate) fn release_members(&self) -> Vec<String> {
        let pairs = match self.member_pairs() {
            Ok(pairs) => pairs,
            Err(err) => {
                warn!(collection = %self.id.uuid, %err, "cannot list members");
                return Vec::new();
            }
        };
        pairs
            .into_iter()
            .filter(|(label, uuid)| !self.release_member(label, uuid))
            .map(|(label, _)| label)
            .collect()
    }

    /// Borrowed handle to the member `label`.
    pub fn get(&self, label: &str) -> CollectionResult<InstanceRef> {
        let uuid = self
            .member_uuid(label)
            .ok_or_else(|| CollectionError::NotFound(format!("label '{label}'")))?;
        Ok(self.resolve_member(label, &uuid)?.into_borrowed())
    }

    /// Borrowed handle to the member with uuid or URI `id`.
    pub fn get_by_id(&self, id: &str) -> CollectionResult<InstanceRef> {
        let uuid = derive_uuid(Some(id))?.uuid;
        let quad = self
            .find_first(&QuadPattern::any().predicate(HAS_UUID).object(&uuid))
            .ok_or_else(|| CollectionError::NotFound(format!("instance {id}")))?;
        Ok(self.resolve_member(quad.subject(), &uuid)?.into_borrowed())
    }

    /// New reference to the member `label`, cast to metadata `as_meta`
    /// through the mapping resolver when it differs from the member's own.
    pub fn get_new(&self, label: &str, as_meta: Option<&str>) -> CollectionResult<OwnedInstance> {
        let uuid = self
            .member_uuid(label)
            .ok_or_else(|| CollectionError::NotFound(format!("label '{label}'")))?;
        let member = self.resolve_member(label, &uuid)?;
        match as_meta {
            Some(meta) if meta != member.meta_uri() => {
                let mapper = self.mapper.as_ref().ok_or_else(|| InstanceError::NoMapping {
                    instance: member.uuid().to_string(),
                    meta: meta.to_string(),
                })?;
                Ok(mapper.map(member.handle(), meta)?)
            }
            _ => Ok(member),
        }
    }

    pub fn has(&self, label: &str) -> bool {
        let pattern = QuadPattern::any()
            .subject(label)
            .predicate(IS_A)
            .object(INSTANCE);
        self.store.borrow().find_first(&pattern).is_some()
    }

    /// Returns `true` if a member has uuid or URI `id`.
    pub fn has_id(&self, id: &str) -> bool {
        let Ok(derived) = derive_uuid(Some(id)) else {
            return false;
        };
        let pattern = QuadPattern::any().predicate(HAS_UUID).object(&derived.uuid);
        self.store.borrow().find_first(&pattern).is_some()
    }

    /// Number of members.
    pub fn count(&self) -> usize {
        self.count_matching(&QuadPattern::any().predicate(IS_A).object(INSTANCE))
    }

    /// Labels of all members, in store order.
    pub fn labels(&self) -> CollectionResult<Vec<String>> {
        let pattern = QuadPattern::any().predicate(IS_A).object(INSTANCE);
        Ok(self
            .find_all(&pattern)?
            .into_iter()
            .map(|q| q.subject().to_string())
            .collect())
    }

    /// Iterate over borrowed handles to the members.
    pub fn iter(&self) -> CollectionResult<Members<'_, B>> {
        Ok(Members {
            scan: MemberScan::open(self)?,
        })
    }

    /// Iterate over new references to the members.
    pub fn iter_new(&self) -> CollectionResult<MembersNew<'_, B>> {
        Ok(MembersNew {
            scan: MemberScan::open(self)?,
        })
    }

    // ---- Lifecycle ----

    /// Release every member reference and destroy the store. Runs once.
    pub(crate) fn deinit(&self) {
        if self.deinitialized.replace(true) {
            return;
        }
        let unresolved = self.release_members();
        let state = self.store.borrow_mut().destroy();
        self.nrelations.set(0);
        debug!(
            uuid = %self.id.uuid,
            ?state,
            unresolved = unresolved.len(),
            "collection released"
        );
    }

    fn hash_error(&self, err: CollectionError) -> InstanceError {
        match err {
            CollectionError::Instance(err) => err,
            CollectionError::HashCycle { uuid } => InstanceError::HashCycle { uuid },
            other => InstanceError::Hash {
                instance: self.id.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Remove the `_maps-to` relation of every dimmap of `label` while
/// `cursor` walks the dimmaps.
fn drain_dimmaps<B: RelationBackend>(
    store: &mut B,
    cursor: &mut Cursor,
    label: &str,
) -> StoreResult<usize> {
    let pattern = QuadPattern::any().subject(label).predicate(HAS_DIMMAP);
    let mut removed = 0;
    loop {
        let Some(id) = store.next(cursor, &pattern).map(|q| q.object().to_string()) else {
            break;
        };
        if store.remove_by_id(&id)? {
            removed += 1;
        }
    }
    Ok(removed)
}

impl<B: RelationBackend> Instance for Collection<B> {
    fn id(&self) -> &InstanceId {
        &self.id
    }

    fn meta_uri(&self) -> &str {
        COLLECTION_META_URI
    }

    fn incref(&self) -> usize {
        let count = self.refcount.get() + 1;
        self.refcount.set(count);
        count
    }

    /// Releasing the last reference releases every member.
    fn decref(&self) -> usize {
        let count = self.refcount.get();
        if count == 0 {
            warn!(uuid = %self.id.uuid, "decref on freed collection");
            return 0;
        }
        self.refcount.set(count - 1);
        if count == 1 {
            self.deinit();
        }
        count - 1
    }

    fn refcount(&self) -> usize {
        self.refcount.get()
    }

    fn get_property(&self, name: &str) -> dlite_instance::Result<Value> {
        if name != RELATIONS_PROPERTY {
            return Err(InstanceError::UnknownProperty {
                instance: self.id.to_string(),
                name: name.to_string(),
            });
        }
        let relations = self.save_relations().map_err(|e| InstanceError::InvalidValue {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(relations_to_value(&relations))
    }

    /// Setting `relations` reloads the collection from the given rows.
    fn set_property(&self, name: &str, value: Value) -> dlite_instance::Result<()> {
        if name != RELATIONS_PROPERTY {
            return Err(InstanceError::UnknownProperty {
                instance: self.id.to_string(),
                name: name.to_string(),
            });
        }
        let invalid = |e: CollectionError| InstanceError::InvalidValue {
            name: name.to_string(),
            reason: e.to_string(),
        };
        let namespace = self.config.store.id_namespace.as_deref();
        let quads = relations_from_value(&value, namespace).map_err(invalid)?;
        self.load_relations(quads).map_err(invalid)?;
        Ok(())
    }

    fn content_hash(&self) -> dlite_instance::Result<Digest> {
        self.guarded_hash().map_err(|e| self.hash_error(e))
    }
}

impl<B: RelationBackend> Drop for Collection<B> {
    fn drop(&mut self) {
        self.deinit();
    }
}

impl<B: RelationBackend> fmt::Debug for Collection<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.id)
            .field("refcount", &self.refcount.get())
            .field("nrelations", &self.nrelations.get())
            .field("deinitialized", &self.deinitialized.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Member iteration
// ---------------------------------------------------------------------------

/// Cursor over the `_has-uuid` relations of a collection. Closes its cursor
/// on drop.
struct MemberScan<'a, B: RelationBackend> {
    collection: &'a Collection<B>,
    cursor: Option<Cursor>,
}

impl<'a, B: RelationBackend> MemberScan<'a, B> {
    fn open(collection: &'a Collection<B>) -> CollectionResult<Self> {
        let cursor = collection.open_cursor()?;
        Ok(Self {
            collection,
            cursor: Some(cursor),
        })
    }

    /// Next resolvable member. Unresolvable members are skipped.
    fn next_member(&mut self) -> Option<OwnedInstance> {
        let cursor = self.cursor.as_mut()?;
        let pattern = QuadPattern::any().predicate(HAS_UUID);
        loop {
            let (label, uuid) = {
                let store = self.collection.store.borrow();
                let quad = store.next(cursor, &pattern)?;
                (quad.subject().to_string(), quad.object().to_string())
            };
            match self.collection.registry.resolve(&uuid) {
                Some(member) => return Some(member),
                None => warn!(
                    collection = %self.collection.id.uuid,
                    label,
                    uuid,
                    "skipping unresolved member"
                ),
            }
        }
    }
}

impl<B: RelationBackend> Drop for MemberScan<'_, B> {
    fn drop(&mut self) {
        let Some(cursor) = self.cursor.take() else {
            return;
        };
        match self.collection.store.try_borrow_mut() {
            Ok(mut store) => {
                if let Err(err) = store.close_cursor(cursor) {
                    warn!(%err, "failed to close member cursor");
                }
            }
            Err(_) => warn!("relation store busy, member cursor left open"),
        }
        self.collection.sync();
    }
}

/// Iterator over borrowed member handles. See [`Collection::iter`].
pub struct Members<'a, B: RelationBackend = ArrayStore> {
    scan: MemberScan<'a, B>,
}

impl<B: RelationBackend> Iterator for Members<'_, B> {
    type Item = InstanceRef;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan.next_member().map(OwnedInstance::into_borrowed)
    }
}

/// Iterator over new member references. See [`Collection::iter_new`].
pub struct MembersNew<'a, B: RelationBackend = ArrayStore> {
    scan: MemberScan<'a, B>,
}

impl<B: RelationBackend> Iterator for MembersNew<'_, B> {
    type Item = OwnedInstance;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan.next_member()
    }
}
