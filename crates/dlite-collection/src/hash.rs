//! Recursive, order-independent content hash of a collection.
//!
//! The digest covers the sorted relations of the collection. Every
//! `_has-uuid` relation is replaced by `(label, _has-hash, hex)` where `hex`
//! is the content hash of the member, taken from a cached `_has-hash`
//! relation when one exists and computed recursively otherwise. Cached
//! values must parse as a [`Digest`] and are fed in normalised form. The result
//! depends on what the members contain, not on where they live or which
//! uuid they carry.

use std::collections::HashMap;

use dlite_crypto::{ContentHasher, DigestStream};
use dlite_instance::{Instance, InstanceError, InstanceRef};
use dlite_triplestore::RelationBackend;
use dlite_types::{Digest, Quad};
use tracing::debug;

use crate::collection::{Collection, ParentRef};
use crate::error::{CollectionError, CollectionResult};
use crate::vocab::{COLLECTION_META_URI, HAS_HASH, HAS_UUID};

impl<B: RelationBackend> Collection<B> {
    /// Content hash of the collection and, recursively, of its members.
    ///
    /// Fails with [`CollectionError::HashCycle`] if the collection
    /// transitively contains itself, and with
    /// [`CollectionError::NotFound`] if an uncached member cannot be
    /// resolved.
    pub fn content_hash(&self) -> CollectionResult<Digest> {
        self.guarded_hash()
    }

    pub(crate) fn guarded_hash(&self) -> CollectionResult<Digest> {
        if self.hashing.replace(true) {
            return Err(CollectionError::HashCycle {
                uuid: self.id.uuid.clone(),
            });
        }
        let result = self.compute_hash();
        self.hashing.set(false);
        result
    }

    fn compute_hash(&self) -> CollectionResult<Digest> {
        let mut quads = self.store.borrow().quads();
        quads.sort();

        let cached = cached_hashes(&quads)?;

        let mut stream = ContentHasher::COLLECTION.stream();
        stream.update_field(COLLECTION_META_URI);
        match self.parent.borrow().as_ref() {
            Some(parent) => stream
                .update_optional(Some(&parent.uuid))
                .update_field(&parent.hash.to_hex()),
            None => stream.update_optional(None),
        };

        let mut recomputed = 0usize;
        for quad in &quads {
            match quad.predicate() {
                HAS_HASH => continue,
                HAS_UUID => {
                    let digest = match cached.get(quad.subject()) {
                        Some(digest) => *digest,
                        None => {
                            recomputed += 1;
                            self.member_hash(quad)?
                        }
                    };
                    feed(&mut stream, quad.subject(), HAS_HASH, &digest.to_hex(), None);
                }
                _ => feed(
                    &mut stream,
                    quad.subject(),
                    quad.predicate(),
                    quad.object(),
                    quad.datatype(),
                ),
            }
        }

        let digest = stream.finalize();
        debug!(
            uuid = %self.id.uuid,
            relations = quads.len(),
            recomputed,
            digest = %digest.short_hex(),
            "collection hashed"
        );
        Ok(digest)
    }

    fn member_hash(&self, quad: &Quad) -> CollectionResult<Digest> {
        let member = self.registry.resolve(quad.object()).ok_or_else(|| {
            CollectionError::NotFound(format!(
                "instance {} (label '{}')",
                quad.object(),
                quad.subject()
            ))
        })?;
        member.content_hash().map_err(|err| match err {
            InstanceError::HashCycle { uuid } => CollectionError::HashCycle { uuid },
            other => CollectionError::Instance(other),
        })
    }

    // ---- Provenance ----

    /// Record `parent` as the previous version of this collection. The
    /// parent's uuid and current content hash seed every later hash.
    pub fn set_parent(&self, parent: &InstanceRef) -> CollectionResult<()> {
        let hash = parent.content_hash()?;
        *self.parent.borrow_mut() = Some(ParentRef {
            uuid: parent.uuid().to_string(),
            hash,
        });
        Ok(())
    }

    pub fn parent(&self) -> Option<ParentRef> {
        self.parent.borrow().clone()
    }

    pub fn clear_parent(&self) {
        self.parent.borrow_mut().take();
    }

    pub(crate) fn restore_parent(&self, parent: Option<ParentRef>) {
        *self.parent.borrow_mut() = parent;
    }
}

/// Cached member digests by label. A malformed cache entry is an error.
fn cached_hashes(quads: &[Quad]) -> CollectionResult<HashMap<&str, Digest>> {
    quads
        .iter()
        .filter(|q| q.predicate() == HAS_HASH)
        .map(|q| {
            let digest = Digest::parse_hex(q.object()).map_err(|err| {
                CollectionError::InvalidRelation(format!(
                    "cached hash of '{}': {err}",
                    q.subject()
                ))
            })?;
            Ok((q.subject(), digest))
        })
        .collect()
}

fn feed(
    stream: &mut DigestStream,
    subject: &str,
    predicate: &str,
    object: &str,
    datatype: Option<&str>,
) {
    stream
        .update_field(subject)
        .update_field(predicate)
        .update_field(object)
        .update_optional(datatype);
}
