//! Subject-predicate-object-datatype relations.
//!
//! A [`Quad`] is the atomic relation unit stored by a relation store. Its
//! `id` is derived from the four content fields so that identical relations
//! deduplicate and can be looked up in O(1).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Compute the id of a relation.
///
/// The id is the hex-encoded, domain-separated BLAKE3 hash of the subject,
/// predicate, object and (if present) datatype, each length-prefixed. When
/// `namespace` is given it is prepended verbatim, which turns ids into URIs.
/// An absent datatype contributes nothing, so a quad without datatype has
/// the same id as the corresponding plain triple.
pub fn quad_id(
    namespace: Option<&str>,
    subject: &str,
    predicate: &str,
    object: &str,
    datatype: Option<&str>,
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"dlite-quad-v1:");
    for field in [subject, predicate, object] {
        update_field(&mut hasher, field);
    }
    if let Some(datatype) = datatype {
        update_field(&mut hasher, datatype);
    }
    let digest = hex::encode(hasher.finalize().as_bytes());
    match namespace {
        Some(ns) => format!("{ns}{digest}"),
        None => digest,
    }
}

fn update_field(hasher: &mut blake3::Hasher, field: &str) {
    hasher.update(&(field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

/// An immutable subject-predicate-object-datatype relation.
///
/// Fields are private: once constructed a quad never changes, which is what
/// allows stores to index it by `id`. Ordering compares subject, predicate,
/// object and datatype in that order.
///
/// Deserialization reads only the content fields and recomputes the id
/// without a namespace; a serialized `id` is ignored.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "QuadFields")]
pub struct Quad {
    subject: String,
    predicate: String,
    object: String,
    datatype: Option<String>,
    id: String,
}

#[derive(Deserialize)]
struct QuadFields {
    subject: String,
    predicate: String,
    object: String,
    #[serde(default)]
    datatype: Option<String>,
}

impl From<QuadFields> for Quad {
    fn from(fields: QuadFields) -> Self {
        Quad::new(
            fields.subject,
            fields.predicate,
            fields.object,
            fields.datatype.as_deref(),
        )
    }
}

impl Quad {
    /// Create a quad with an id computed from its content.
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        datatype: Option<&str>,
    ) -> Self {
        Self::with_namespace(None, subject, predicate, object, datatype)
    }

    /// Create a quad whose computed id is prefixed with `namespace`.
    pub fn with_namespace(
        namespace: Option<&str>,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        datatype: Option<&str>,
    ) -> Self {
        let subject = subject.into();
        let predicate = predicate.into();
        let object = object.into();
        let id = quad_id(namespace, &subject, &predicate, &object, datatype);
        Self {
            subject,
            predicate,
            object,
            datatype: datatype.map(str::to_string),
            id,
        }
    }

    /// Create a quad with an explicitly supplied id.
    pub fn with_id(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        datatype: Option<&str>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            datatype: datatype.map(str::to_string),
            id: id.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    pub fn object(&self) -> &str {
        &self.object
    }

    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }

    /// The content-derived (or explicitly assigned) id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns `true` if this quad has the same content as `other`,
    /// regardless of id.
    pub fn same_content(&self, other: &Quad) -> bool {
        self.subject == other.subject
            && self.predicate == other.predicate
            && self.object == other.object
            && self.datatype == other.datatype
    }
}

impl fmt::Debug for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut t = f.debug_tuple("Quad");
        t.field(&self.subject).field(&self.predicate).field(&self.object);
        if let Some(d) = &self.datatype {
            t.field(d);
        }
        t.finish()
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}", self.subject, self.predicate, self.object)?;
        if let Some(d) = &self.datatype {
            write!(f, ", {d}")?;
        }
        write!(f, ")")
    }
}

/// A match pattern over the four quad fields.
///
/// `None` in any position is a wildcard. An exact datatype only matches
/// quads that carry that datatype.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuadPattern<'a> {
    pub subject: Option<&'a str>,
    pub predicate: Option<&'a str>,
    pub object: Option<&'a str>,
    pub datatype: Option<&'a str>,
}

impl<'a> QuadPattern<'a> {
    /// Pattern matching every quad.
    pub const fn any() -> Self {
        Self {
            subject: None,
            predicate: None,
            object: None,
            datatype: None,
        }
    }

    /// Pattern from optional subject, predicate and object.
    pub const fn triple(
        subject: Option<&'a str>,
        predicate: Option<&'a str>,
        object: Option<&'a str>,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
            datatype: None,
        }
    }

    pub fn subject(mut self, subject: &'a str) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn predicate(mut self, predicate: &'a str) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn object(mut self, object: &'a str) -> Self {
        self.object = Some(object);
        self
    }

    pub fn datatype(mut self, datatype: &'a str) -> Self {
        self.datatype = Some(datatype);
        self
    }

    /// Returns `true` if no field is constrained.
    pub fn is_wildcard(&self) -> bool {
        self.subject.is_none()
            && self.predicate.is_none()
            && self.object.is_none()
            && self.datatype.is_none()
    }

    pub fn matches(&self, quad: &Quad) -> bool {
        self.subject.map_or(true, |s| s == quad.subject())
            && self.predicate.map_or(true, |p| p == quad.predicate())
            && self.object.map_or(true, |o| o == quad.object())
            && self.datatype.map_or(true, |d| Some(d) == quad.datatype())
    }
}
