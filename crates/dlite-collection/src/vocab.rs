//! Reserved predicate vocabulary.
//!
//! These strings are a fixed wire format: they end up in serialized
//! collections and must not change.

/// `(label, _is-a, "Instance")`: label is a collection member.
pub const IS_A: &str = "_is-a";

/// `(label, _has-uuid, uuid)`: label refers to this member instance.
pub const HAS_UUID: &str = "_has-uuid";

/// `(label, _has-meta, uri)`: metadata of the member.
pub const HAS_META: &str = "_has-meta";

/// `(label, _has-dimmap, relation-id)`: label has a dimension mapping.
pub const HAS_DIMMAP: &str = "_has-dimmap";

/// `(instance-dim, _maps-to, collection-dim)`: dimension alias.
pub const MAPS_TO: &str = "_maps-to";

/// `(label, _has-hash, hex)`: cached content hash of the member.
pub const HAS_HASH: &str = "_has-hash";

/// Object of every `_is-a` membership relation.
pub const INSTANCE: &str = "Instance";

/// Metadata URI of collections.
pub const COLLECTION_META_URI: &str = "http://onto-ns.com/meta/0.1/Collection";

/// Name of the single array property of a collection.
pub const RELATIONS_PROPERTY: &str = "relations";

/// Name of the single dimension of a collection.
pub const NRELATIONS_DIMENSION: &str = "nrelations";

/// Returns `true` for predicates reserved for collection bookkeeping.
pub fn is_reserved(predicate: &str) -> bool {
    matches!(
        predicate,
        IS_A | HAS_UUID | HAS_META | HAS_DIMMAP | MAPS_TO | HAS_HASH
    )
}
