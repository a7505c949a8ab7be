use crate::adapter::traits::{page_slice, MappingAdapter, Paradigm};
use crate::error::InspectError;
use crate::logic::classify;
use crate::model::{AttrValue, Record, RelationDescriptor};
use anyhow::anyhow;
use std::collections::BTreeMap;

/// Relation macros as a relational mapping layer declares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    BelongsTo,
    HasOne,
    HasMany,
    HasAndBelongsToMany,
}

/// A declared association on a relational model class.
#[derive(Debug, Clone)]
pub struct AssociationDef {
    pub name: String,
    pub kind: AssociationKind,
    pub class_name: String,
    /// Column on the owning side for `belongs_to`, on the target side for
    /// `has_one`/`has_many`. Unused for `has_and_belongs_to_many`.
    pub foreign_key: Option<String>,
    pub inverse_of: Option<String>,
    /// Join table backing `has_and_belongs_to_many`.
    pub join_table: Option<String>,
}

/// A declared relational model class: columns plus association reflections.
#[derive(Debug, Clone)]
pub struct RelationalModel {
    pub name: String,
    pub columns: Vec<String>,
    pub associations: Vec<AssociationDef>,
    /// Abstract base classes are registered for completeness but never
    /// eligible for listing or record access.
    pub abstract_class: bool,
}

#[derive(Debug, Clone)]
struct Row {
    pk: u64,
    values: BTreeMap<String, AttrValue>,
}

#[derive(Debug, Clone)]
struct JoinRow {
    left_model: String,
    left_id: String,
    right_model: String,
    right_id: String,
}

/// Host-registered snapshot of a relational mapping layer: declared model
/// classes, their backing tables, and join tables. Primary keys are assigned
/// monotonically at insert so newest-first ordering is well defined.
#[derive(Debug, Default, Clone)]
pub struct RelationalRegistry {
    models: BTreeMap<String, RelationalModel>,
    tables: BTreeMap<String, Vec<Row>>,
    joins: BTreeMap<String, Vec<JoinRow>>,
    next_pk: u64,
}

impl RelationalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_model(&mut self, model: RelationalModel) {
        self.models.insert(model.name.clone(), model);
    }

    /// Inserts a row, assigns its primary key, and returns the id string.
    pub fn insert(&mut self, model: &str, mut values: BTreeMap<String, AttrValue>) -> String {
        self.next_pk += 1;
        let pk = self.next_pk;
        values.insert("id".to_string(), AttrValue::Int(pk as i64));
        self.tables
            .entry(model.to_string())
            .or_default()
            .push(Row { pk, values });
        pk.to_string()
    }

    /// Records a many-to-many pair in a join table. Each side names the
    /// model it belongs to so lookups work from either direction.
    pub fn join(&mut self, table: &str, left: (&str, &str), right: (&str, &str)) {
        self.joins.entry(table.to_string()).or_default().push(JoinRow {
            left_model: left.0.to_string(),
            left_id: left.1.to_string(),
            right_model: right.0.to_string(),
            right_id: right.1.to_string(),
        });
    }
}

/// The relational variant of the mapping adapter.
pub struct RelationalAdapter {
    registry: RelationalRegistry,
}

impl RelationalAdapter {
    pub fn new(registry: RelationalRegistry) -> Self {
        Self { registry }
    }

    fn model_def(&self, model: &str) -> Result<&RelationalModel, InspectError> {
        self.registry
            .models
            .get(model)
            .ok_or_else(|| InspectError::model_not_found(model))
    }

    /// Like `model_def`, but abstract classes are not eligible for record
    /// access and resolve as missing.
    fn eligible_model(&self, model: &str) -> Result<&RelationalModel, InspectError> {
        let def = self.model_def(model)?;
        if def.abstract_class {
            return Err(InspectError::model_not_found(model));
        }
        Ok(def)
    }

    fn association(&self, model: &str, name: &str) -> Result<&AssociationDef, InspectError> {
        self.model_def(model)?
            .associations
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| InspectError::relation_not_found(model, name))
    }

    /// All rows of a model's table, newest-first by primary key.
    fn rows_desc(&self, model: &str) -> Vec<&Row> {
        let mut rows: Vec<&Row> = self
            .registry
            .tables
            .get(model)
            .map(|t| t.iter().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| b.pk.cmp(&a.pk));
        rows
    }

    fn find_row(&self, model: &str, id: &str) -> Option<&Row> {
        self.registry
            .tables
            .get(model)?
            .iter()
            .find(|row| row.pk.to_string() == id)
    }

    fn record_from(&self, model: &str, row: &Row) -> Record {
        Record {
            model: model.to_string(),
            id: row.pk.to_string(),
            attributes: row.values.clone(),
            embedded: BTreeMap::new(),
        }
    }

    /// Rows of `target` whose `foreign_key` column points at `id`,
    /// newest-first.
    fn rows_referencing(&self, target: &str, foreign_key: &str, id: &str) -> Vec<&Row> {
        self.rows_desc(target)
            .into_iter()
            .filter(|row| {
                row.values
                    .get(foreign_key)
                    .and_then(AttrValue::id_string)
                    .as_deref()
                    == Some(id)
            })
            .collect()
    }

    /// Partner ids across a join table, from either side of the pair.
    fn join_partners(&self, table: &str, model: &str, id: &str) -> Vec<String> {
        self.registry
            .joins
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter_map(|j| {
                        if j.left_model == model && j.left_id == id {
                            Some(j.right_id.clone())
                        } else if j.right_model == model && j.right_id == id {
                            Some(j.left_id.clone())
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolves the full related set for a relation, newest-first. Paging
    /// and counting both window this.
    fn related_records(
        &self,
        record: &Record,
        relation: &RelationDescriptor,
    ) -> Result<Vec<Record>, InspectError> {
        let assoc = self.association(&record.model, &relation.name)?;
        match assoc.kind {
            AssociationKind::BelongsTo => {
                let fk = assoc.foreign_key.as_deref().ok_or_else(|| {
                    anyhow!("belongs_to '{}' on {} has no foreign key", assoc.name, record.model)
                })?;
                let target_id = record.attributes.get(fk).and_then(AttrValue::id_string);
                Ok(target_id
                    .and_then(|id| self.find_row(&assoc.class_name, &id))
                    .map(|row| self.record_from(&assoc.class_name, row))
                    .into_iter()
                    .collect())
            }
            AssociationKind::HasOne | AssociationKind::HasMany => {
                let fk = assoc.foreign_key.as_deref().ok_or_else(|| {
                    anyhow!("association '{}' on {} has no foreign key", assoc.name, record.model)
                })?;
                let mut rows = self.rows_referencing(&assoc.class_name, fk, &record.id);
                if assoc.kind == AssociationKind::HasOne {
                    rows.truncate(1);
                }
                Ok(rows
                    .into_iter()
                    .map(|row| self.record_from(&assoc.class_name, row))
                    .collect())
            }
            AssociationKind::HasAndBelongsToMany => {
                let table = assoc.join_table.as_deref().ok_or_else(|| {
                    anyhow!("association '{}' on {} has no join table", assoc.name, record.model)
                })?;
                let mut records: Vec<Record> = self
                    .join_partners(table, &record.model, &record.id)
                    .into_iter()
                    .filter_map(|id| self.find_row(&assoc.class_name, &id))
                    .map(|row| self.record_from(&assoc.class_name, row))
                    .collect();
                records.sort_by_key(|r| std::cmp::Reverse(r.id.parse::<u64>().unwrap_or(0)));
                Ok(records)
            }
        }
    }
}

#[async_trait::async_trait]
impl MappingAdapter for RelationalAdapter {
    fn paradigm(&self) -> Paradigm {
        Paradigm::Relational
    }

    fn id_field(&self) -> &'static str {
        "id"
    }

    fn model_names(&self) -> Vec<String> {
        self.registry
            .models
            .values()
            .filter(|m| !m.abstract_class)
            .map(|m| m.name.clone())
            .collect()
    }

    fn fields(&self, model: &str) -> Result<Vec<String>, InspectError> {
        let def = self.model_def(model)?;
        Ok(def
            .columns
            .iter()
            .filter(|c| !c.starts_with('_'))
            .cloned()
            .collect())
    }

    fn relations(&self, model: &str) -> Result<Vec<RelationDescriptor>, InspectError> {
        let def = self.model_def(model)?;
        Ok(def.associations.iter().map(classify::classify_association).collect())
    }

    async fn find(&self, model: &str, id: &str) -> Result<Record, InspectError> {
        self.eligible_model(model)?;
        self.find_row(model, id)
            .map(|row| self.record_from(model, row))
            .ok_or_else(|| InspectError::record_not_found(model, id))
    }

    async fn list_page(
        &self,
        model: &str,
        page: usize,
        per_page: usize,
    ) -> Result<(Vec<Record>, u64), InspectError> {
        self.eligible_model(model)?;
        let rows = self.rows_desc(model);
        let total = rows.len() as u64;
        let records = page_slice(&rows, page, per_page)
            .into_iter()
            .map(|row| self.record_from(model, row))
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
        let assoc = self.association(&record.model, &relation.name)?;
        // belongs_to counts foreign-key presence without a fetch
        if assoc.kind == AssociationKind::BelongsTo {
            let fk = assoc.foreign_key.as_deref().ok_or_else(|| {
                anyhow!("belongs_to '{}' on {} has no foreign key", assoc.name, record.model)
            })?;
            let present = record.attributes.get(fk).and_then(AttrValue::id_string).is_some();
            return Ok(u64::from(present));
        }
        Ok(self.related_records(record, relation)?.len() as u64)
    }
}
