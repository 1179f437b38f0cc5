//! Serialized form of a collection.
//!
//! A collection persists as a single `relations` property: an array of
//! `[subject, predicate, object]` or `[subject, predicate, object,
//! datatype]` rows. Members are persisted separately; loading relations
//! resolves them again through the registry.

use std::rc::Rc;

use dlite_instance::InstanceRegistry;
use dlite_triplestore::{ArrayStore, RelationBackend};
use dlite_types::{derive_uuid, InstanceId, Quad, QuadPattern};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::collection::{Collection, ParentRef};
use crate::config::CollectionConfig;
use crate::error::{CollectionError, CollectionResult};
use crate::vocab::COLLECTION_META_URI;

/// One serialized relation: `[s, p, o]` or `[s, p, o, d]`.
pub type RelationRow = Vec<String>;

pub fn quad_to_row(quad: &Quad) -> RelationRow {
    let mut row = vec![
        quad.subject().to_string(),
        quad.predicate().to_string(),
        quad.object().to_string(),
    ];
    if let Some(datatype) = quad.datatype() {
        row.push(datatype.to_string());
    }
    row
}

/// Parse a row, computing the quad id with `namespace`.
pub fn row_to_quad(row: &[String], namespace: Option<&str>) -> CollectionResult<Quad> {
    match row {
        [s, p, o] => Ok(Quad::with_namespace(namespace, s.as_str(), p.as_str(), o.as_str(), None)),
        [s, p, o, d] => Ok(Quad::with_namespace(
            namespace,
            s.as_str(),
            p.as_str(),
            o.as_str(),
            Some(d.as_str()),
        )),
        _ => Err(CollectionError::InvalidRelation(format!(
            "expected 3 or 4 fields, got {}",
            row.len()
        ))),
    }
}

pub(crate) fn relations_to_value(quads: &[Quad]) -> Value {
    Value::Array(
        quads
            .iter()
            .map(|q| Value::Array(quad_to_row(q).into_iter().map(Value::String).collect()))
            .collect(),
    )
}

pub(crate) fn relations_from_value(
    value: &Value,
    namespace: Option<&str>,
) -> CollectionResult<Vec<Quad>> {
    let rows: Vec<RelationRow> = serde_json::from_value(value.clone())
        .map_err(|e| CollectionError::InvalidRelation(e.to_string()))?;
    rows.iter().map(|row| row_to_quad(row, namespace)).collect()
}

/// Outcome of [`Collection::load_relations`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Relations in the store after loading.
    pub relations: usize,
    /// Members resolved through the registry.
    pub resolved: usize,
    /// Labels of members that could not be resolved.
    pub unresolved: Vec<String>,
}

impl LoadReport {
    /// Returns `true` if every member was resolved.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDimensions {
    pub nrelations: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionProperties {
    pub relations: Vec<RelationRow>,
}

/// Serialized collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDocument {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub meta: String,
    pub dimensions: CollectionDimensions,
    pub properties: CollectionProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
}

impl CollectionDocument {
    pub fn from_json(json: &str) -> CollectionResult<Self> {
        serde_json::from_str(json).map_err(|e| CollectionError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> CollectionResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CollectionError::Serialization(e.to_string()))
    }

    fn validate(&self) -> CollectionResult<()> {
        if self.meta != COLLECTION_META_URI {
            return Err(CollectionError::InvalidDocument(format!(
                "expected meta {COLLECTION_META_URI}, got {}",
                self.meta
            )));
        }
        if self.dimensions.nrelations != self.properties.relations.len() {
            return Err(CollectionError::InvalidDocument(format!(
                "nrelations is {} but {} relations are stored",
                self.dimensions.nrelations,
                self.properties.relations.len()
            )));
        }
        Ok(())
    }
}

impl<B: RelationBackend> Collection<B> {
    /// Every live relation, walked with a store cursor. Resynchronises
    /// `nrelations` with the store.
    pub fn save_relations(&self) -> CollectionResult<Vec<Quad>> {
        let mut cursor = self.open_cursor()?;
        let mut quads = Vec::with_capacity(self.nrelations());
        while let Some(quad) = self.find(&mut cursor, &QuadPattern::any()) {
            quads.push(quad);
        }
        self.close_cursor(cursor)?;
        Ok(quads)
    }

    /// Replace the relations of the collection with `quads` and take a
    /// reference to every member they name.
    ///
    /// References held for the previous members are released first. A
    /// member that cannot be resolved is logged and listed in the report;
    /// with `strict_load` it turns the call into an error once the
    /// relations have been loaded.
    pub fn load_relations(&self, quads: Vec<Quad>) -> CollectionResult<LoadReport> {
        self.ensure_live()?;
        let stale = self.release_members();
        if !stale.is_empty() {
            debug!(uuid = %self.id.uuid, stale = stale.len(), "previous members left unreleased");
        }
        {
            let mut store = self.store.borrow_mut();
            store.clear();
            store.add_batch(quads)?;
        }
        self.sync();

        let mut report = LoadReport {
            relations: self.nrelations(),
            ..Default::default()
        };
        for (label, uuid) in self.member_pairs()? {
            match self.registry.resolve(&uuid) {
                Some(member) => {
                    // The lookup reference becomes the collection's own.
                    member.into_inner();
                    report.resolved += 1;
                }
                None => {
                    warn!(
                        collection = %self.id.uuid,
                        label = %label,
                        uuid = %uuid,
                        "cannot resolve member while loading"
                    );
                    report.unresolved.push(label);
                }
            }
        }

        if self.config().strict_load && !report.is_complete() {
            return Err(CollectionError::UnresolvedMembers {
                labels: report.unresolved,
            });
        }
        debug!(
            uuid = %self.id.uuid,
            relations = report.relations,
            resolved = report.resolved,
            unresolved = report.unresolved.len(),
            "relations loaded"
        );
        Ok(report)
    }

    pub fn to_document(&self) -> CollectionResult<CollectionDocument> {
        let relations: Vec<RelationRow> = self.save_relations()?.iter().map(quad_to_row).collect();
        Ok(CollectionDocument {
            uuid: self.id.uuid.clone(),
            uri: self.id.uri.clone(),
            meta: COLLECTION_META_URI.to_string(),
            dimensions: CollectionDimensions {
                nrelations: relations.len(),
            },
            properties: CollectionProperties { relations },
            parent: self.parent(),
        })
    }

    /// Rebuild a collection over backend `B` from its document.
    pub fn from_document_with_config(
        doc: CollectionDocument,
        registry: Rc<dyn InstanceRegistry>,
        config: CollectionConfig,
    ) -> CollectionResult<(Self, LoadReport)> {
        doc.validate()?;
        let namespace = config.store.id_namespace.clone();
        let quads = doc
            .properties
            .relations
            .iter()
            .map(|row| row_to_quad(row, namespace.as_deref()))
            .collect::<CollectionResult<Vec<_>>>()?;
        let id = InstanceId {
            uuid: derive_uuid(Some(&doc.uuid))?.uuid,
            uri: doc.uri,
        };
        let collection = Self::from_parts(id, registry, config);
        collection.restore_parent(doc.parent);
        let report = collection.load_relations(quads)?;
        Ok((collection, report))
    }
}

impl Collection<ArrayStore> {
    /// Rebuild a collection from its document with the default
    /// configuration.
    pub fn from_document(
        doc: CollectionDocument,
        registry: Rc<dyn InstanceRegistry>,
    ) -> CollectionResult<(Self, LoadReport)> {
        Self::from_document_with_config(doc, registry, CollectionConfig::default())
    }
}
