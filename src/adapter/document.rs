use crate::adapter::traits::{page_slice, MappingAdapter, Paradigm};
use crate::error::InspectError;
use crate::logic::classify;
use crate::model::{AttrValue, Record, RelationDescriptor};
use anyhow::anyhow;
use log::warn;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Relation macros as a document mapping layer declares them, embedded
/// variants included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocRelationKind {
    BelongsTo,
    HasOne,
    HasMany,
    HasAndBelongsToMany,
    EmbedsOne,
    EmbedsMany,
    /// Inverse of `embeds_one`/`embeds_many`; declared by embedded classes
    /// and filtered out during classification.
    EmbeddedIn,
}

#[derive(Debug, Clone)]
pub struct DocRelationDef {
    pub name: String,
    pub kind: DocRelationKind,
    pub class_name: String,
    /// Referenced relations only: the id field (`belongs_to`, `has_*`) or
    /// the id-array field (`has_and_belongs_to_many`). Embedded relations
    /// carry no key.
    pub foreign_key: Option<String>,
    pub inverse_of: Option<String>,
}

/// A declared document model class: fields plus relation metadata. Embedded
/// classes live inside a parent document and have no query surface of their
/// own.
#[derive(Debug, Clone)]
pub struct DocumentModel {
    pub name: String,
    pub fields: Vec<String>,
    pub relations: Vec<DocRelationDef>,
    pub embedded: bool,
}

/// A materialized document, with embedded children held in-document under
/// their relation names.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub values: BTreeMap<String, AttrValue>,
    pub children: BTreeMap<String, Vec<Document>>,
}

impl Document {
    pub fn new(values: BTreeMap<String, AttrValue>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            values,
            children: BTreeMap::new(),
        }
    }

    pub fn with_id(id: &str, values: BTreeMap<String, AttrValue>) -> Self {
        Self {
            id: id.to_string(),
            values,
            children: BTreeMap::new(),
        }
    }

    pub fn embed(mut self, relation: &str, children: Vec<Document>) -> Self {
        self.children.insert(relation.to_string(), children);
        self
    }
}

/// Host-registered snapshot of a document mapping layer: declared model
/// classes and top-level collections.
#[derive(Debug, Default, Clone)]
pub struct DocumentRegistry {
    models: BTreeMap<String, DocumentModel>,
    collections: BTreeMap<String, Vec<Document>>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_model(&mut self, model: DocumentModel) {
        self.models.insert(model.name.clone(), model);
    }

    /// Inserts a top-level document and returns its id.
    pub fn insert(&mut self, model: &str, document: Document) -> String {
        let id = document.id.clone();
        self.collections.entry(model.to_string()).or_default().push(document);
        id
    }
}

/// The document variant of the mapping adapter. Referenced relations behave
/// like their relational counterparts; embedded collections are fetched as
/// in-memory slices of the already-materialized array.
pub struct DocumentAdapter {
    registry: DocumentRegistry,
}

impl DocumentAdapter {
    pub fn new(registry: DocumentRegistry) -> Self {
        Self { registry }
    }

    fn model_def(&self, model: &str) -> Result<&DocumentModel, InspectError> {
        self.registry
            .models
            .get(model)
            .ok_or_else(|| InspectError::model_not_found(model))
    }

    /// Embedded classes are known (their metadata classifies) but have no
    /// independent query surface, so they resolve as missing here.
    fn eligible_model(&self, model: &str) -> Result<&DocumentModel, InspectError> {
        let def = self.model_def(model)?;
        if def.embedded {
            return Err(InspectError::model_not_found(model));
        }
        Ok(def)
    }

    fn relation_def(&self, model: &str, name: &str) -> Result<&DocRelationDef, InspectError> {
        self.model_def(model)?
            .relations
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| InspectError::relation_not_found(model, name))
    }

    /// Documents of a collection ordered id-descending: stable and
    /// non-overlapping, which is all the paging contract asks for.
    fn docs_desc(&self, model: &str) -> Vec<&Document> {
        let mut docs: Vec<&Document> = self
            .registry
            .collections
            .get(model)
            .map(|c| c.iter().collect())
            .unwrap_or_default();
        docs.sort_by(|a, b| b.id.cmp(&a.id));
        docs
    }

    fn find_doc(&self, model: &str, id: &str) -> Option<&Document> {
        self.registry
            .collections
            .get(model)?
            .iter()
            .find(|doc| doc.id == id)
    }

    fn record_from(&self, model: &str, doc: &Document) -> Record {
        let mut attributes = doc.values.clone();
        attributes.insert("_id".to_string(), AttrValue::Str(doc.id.clone()));

        let mut embedded = BTreeMap::new();
        if let Some(def) = self.registry.models.get(model) {
            for relation in &def.relations {
                if !matches!(relation.kind, DocRelationKind::EmbedsOne | DocRelationKind::EmbedsMany) {
                    continue;
                }
                let Some(children) = doc.children.get(&relation.name) else {
                    continue;
                };
                if !self.registry.models.contains_key(&relation.class_name) {
                    warn!(
                        "embedded relation '{}' on {} targets undeclared class {}",
                        relation.name, model, relation.class_name
                    );
                    continue;
                }
                let records = children
                    .iter()
                    .map(|child| self.record_from(&relation.class_name, child))
                    .collect();
                embedded.insert(relation.name.clone(), records);
            }
        }

        Record {
            model: model.to_string(),
            id: doc.id.clone(),
            attributes,
            embedded,
        }
    }

    fn docs_referencing(&self, target: &str, foreign_key: &str, id: &str) -> Vec<&Document> {
        self.docs_desc(target)
            .into_iter()
            .filter(|doc| {
                doc.values
                    .get(foreign_key)
                    .and_then(AttrValue::id_string)
                    .as_deref()
                    == Some(id)
            })
            .collect()
    }

    /// Full related set for a relation. Embedded variants read the record's
    /// materialized children; referenced variants scan the target collection.
    fn related_records(
        &self,
        record: &Record,
        relation: &RelationDescriptor,
    ) -> Result<Vec<Record>, InspectError> {
        let def = self.relation_def(&record.model, &relation.name)?;
        match def.kind {
            DocRelationKind::BelongsTo => {
                let fk = def.foreign_key.as_deref().ok_or_else(|| {
                    anyhow!("belongs_to '{}' on {} has no foreign key", def.name, record.model)
                })?;
                let target_id = record.attributes.get(fk).and_then(AttrValue::id_string);
                Ok(target_id
                    .and_then(|id| self.find_doc(&def.class_name, &id))
                    .map(|doc| self.record_from(&def.class_name, doc))
                    .into_iter()
                    .collect())
            }
            DocRelationKind::HasOne | DocRelationKind::HasMany => {
                let fk = def.foreign_key.as_deref().ok_or_else(|| {
                    anyhow!("relation '{}' on {} has no foreign key", def.name, record.model)
                })?;
                let mut docs = self.docs_referencing(&def.class_name, fk, &record.id);
                if def.kind == DocRelationKind::HasOne {
                    docs.truncate(1);
                }
                Ok(docs
                    .into_iter()
                    .map(|doc| self.record_from(&def.class_name, doc))
                    .collect())
            }
            DocRelationKind::HasAndBelongsToMany => {
                // the ids-array field on the source document names the pairs
                let fk = def.foreign_key.as_deref().ok_or_else(|| {
                    anyhow!("relation '{}' on {} has no ids field", def.name, record.model)
                })?;
                let ids: Vec<String> = match record.attributes.get(fk) {
                    Some(AttrValue::Array(items)) => {
                        items.iter().filter_map(AttrValue::id_string).collect()
                    }
                    _ => Vec::new(),
                };
                Ok(ids
                    .into_iter()
                    .filter_map(|id| self.find_doc(&def.class_name, &id))
                    .map(|doc| self.record_from(&def.class_name, doc))
                    .collect())
            }
            DocRelationKind::EmbedsOne | DocRelationKind::EmbedsMany => Ok(record
                .embedded
                .get(&def.name)
                .cloned()
                .unwrap_or_default()),
            DocRelationKind::EmbeddedIn => Err(InspectError::Internal(anyhow!(
                "embedded_in '{}' on {} is not expandable",
                def.name,
                record.model
            ))),
        }
    }
}

#[async_trait::async_trait]
impl MappingAdapter for DocumentAdapter {
    fn paradigm(&self) -> Paradigm {
        Paradigm::Document
    }

    fn id_field(&self) -> &'static str {
        "_id"
    }

    fn model_names(&self) -> Vec<String> {
        self.registry
            .models
            .values()
            .filter(|m| !m.embedded)
            .map(|m| m.name.clone())
            .collect()
    }

    fn fields(&self, model: &str) -> Result<Vec<String>, InspectError> {
        let def = self.model_def(model)?;
        Ok(def
            .fields
            .iter()
            .filter(|f| !f.starts_with('_'))
            .cloned()
            .collect())
    }

    fn relations(&self, model: &str) -> Result<Vec<RelationDescriptor>, InspectError> {
        let def = self.model_def(model)?;
        Ok(def
            .relations
            .iter()
            .filter_map(classify::classify_document_relation)
            .collect())
    }

    async fn find(&self, model: &str, id: &str) -> Result<Record, InspectError> {
        self.eligible_model(model)?;
        self.find_doc(model, id)
            .map(|doc| self.record_from(model, doc))
            .ok_or_else(|| InspectError::record_not_found(model, id))
    }

    async fn list_page(
        &self,
        model: &str,
        page: usize,
        per_page: usize,
    ) -> Result<(Vec<Record>, u64), InspectError> {
        self.eligible_model(model)?;
        let docs = self.docs_desc(model);
        let total = docs.len() as u64;
        let records = page_slice(&docs, page, per_page)
            .into_iter()
            .map(|doc| self.record_from(model, doc))
            .collect();
        Ok((records, total))
    }

    async fn fetch_related(
        &self,
        record: &Record,
        relation: &RelationDescriptor,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<Record>, InspectError> {
        let related = self.related_records(record, relation)?;
        Ok(page_slice(&related, page, per_page))
    }

    async fn count_related(
        &self,
        record: &Record,
        relation: &RelationDescriptor,
    ) -> Result<u64, InspectError> {
        let def = self.relation_def(&record.model, &relation.name)?;
        if def.kind == DocRelationKind::BelongsTo {
            let fk = def.foreign_key.as_deref().ok_or_else(|| {
                anyhow!("belongs_to '{}' on {} has no foreign key", def.name, record.model)
            })?;
            let present = record.attributes.get(fk).and_then(AttrValue::id_string).is_some();
            return Ok(u64::from(present));
        }
        Ok(self.related_records(record, relation)?.len() as u64)
    }
}
