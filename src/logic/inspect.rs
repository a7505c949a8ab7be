use crate::adapter::MappingAdapter;
use crate::config::InspectorConfig;
use crate::error::InspectError;
use crate::logic::value::{json_safe, serialize_attributes};
use crate::model::{Cardinality, InstanceNode, Record, RecordPage, RelationDescriptor, RelationStub};
use itertools::Itertools;
use log::warn;
use std::collections::BTreeMap;

/// Table views never render more than this many columns.
const MAX_TABLE_COLUMNS: usize = 30;

/// Serializes single records into instance nodes with lazy relation stubs.
///
/// Stubs carry only a count and a bounded identifier preview, so inspecting
/// an instance costs O(relation count) regardless of related-record volume;
/// full related records come later through the expander.
pub struct InstanceInspector;

impl InstanceInspector {
    /// Resolves a model name against the adapter and configured exclusions.
    /// An excluded model is indistinguishable from an unknown one.
    pub fn resolve_model(
        adapter: &dyn MappingAdapter,
        config: &InspectorConfig,
        name: &str,
    ) -> Result<String, InspectError> {
        if config.is_excluded_model(name) {
            return Err(InspectError::model_not_found(name));
        }
        if !adapter.model_names().iter().any(|m| m == name) {
            return Err(InspectError::model_not_found(name));
        }
        Ok(name.to_string())
    }

    pub async fn inspect(
        adapter: &dyn MappingAdapter,
        config: &InspectorConfig,
        model: &str,
        id: &str,
    ) -> Result<InstanceNode, InspectError> {
        let model = Self::resolve_model(adapter, config, model)?;
        let record = adapter.find(&model, id).await?;
        Ok(Self::build_node(adapter, config, &record).await)
    }

    /// Serializes a record into an instance node. Infallible by design:
    /// reflection or per-relation failures degrade to empty stubs and are
    /// logged, never raised, so one broken relation cannot hide the rest of
    /// the record.
    pub async fn build_node(
        adapter: &dyn MappingAdapter,
        config: &InspectorConfig,
        record: &Record,
    ) -> InstanceNode {
        let descriptors = match adapter.relations(&record.model) {
            Ok(descriptors) => descriptors,
            Err(e) => {
                warn!("relations for {} degraded: {}", record.key(), e);
                Vec::new()
            }
        };

        let mut relations = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            relations.push(Self::build_stub(adapter, config, record, descriptor).await);
        }

        InstanceNode {
            key: record.key(),
            model: record.model.clone(),
            record_id: record.id.clone(),
            attributes: serialize_attributes(record, &config.excluded_attributes),
            relations,
        }
    }

    async fn build_stub(
        adapter: &dyn MappingAdapter,
        config: &InspectorConfig,
        record: &Record,
        descriptor: &RelationDescriptor,
    ) -> RelationStub {
        let mut stub = RelationStub {
            name: descriptor.name.clone(),
            cardinality: descriptor.cardinality,
            target_class: descriptor.target_class.clone(),
            foreign_key: descriptor.foreign_key.clone(),
            is_embedded: descriptor.is_embedded,
            value: None,
            count: 0,
            preview_ids: None,
        };

        match descriptor.cardinality {
            // the foreign-key attribute answers without any fetch
            Cardinality::BelongsTo => {
                stub.value = descriptor
                    .foreign_key
                    .as_deref()
                    .and_then(|fk| record.attributes.get(fk))
                    .and_then(crate::model::AttrValue::id_string);
                stub.count = u64::from(stub.value.is_some());
            }
            Cardinality::HasOne | Cardinality::EmbedsOne => {
                match adapter.fetch_related(record, descriptor, 1, 1).await {
                    Ok(items) => {
                        stub.value = items.first().map(|r| r.id.clone());
                        stub.count = u64::from(stub.value.is_some());
                    }
                    Err(e) => {
                        warn!("stub '{}' on {} degraded: {}", descriptor.name, record.key(), e);
                    }
                }
            }
            Cardinality::HasMany | Cardinality::ManyToMany | Cardinality::EmbedsMany => {
                match adapter.count_related(record, descriptor).await {
                    Ok(count) => match adapter
                        .fetch_related(record, descriptor, 1, config.relation_limit)
                        .await
                    {
                        Ok(items) => {
                            stub.count = count;
                            stub.preview_ids =
                                Some(items.into_iter().map(|r| r.id).collect());
                        }
                        Err(e) => {
                            warn!(
                                "preview for '{}' on {} degraded: {}",
                                descriptor.name,
                                record.key(),
                                e
                            );
                            stub.preview_ids = Some(Vec::new());
                        }
                    },
                    Err(e) => {
                        warn!("count for '{}' on {} degraded: {}", descriptor.name, record.key(), e);
                        stub.preview_ids = Some(Vec::new());
                    }
                }
            }
        }

        stub
    }

    /// One page of a model's records for the table view. Unlike instance
    /// attributes, table columns follow the declared fields directly, id
    /// column first.
    pub async fn list_records(
        adapter: &dyn MappingAdapter,
        config: &InspectorConfig,
        model: &str,
        page: usize,
        per_page: usize,
    ) -> Result<RecordPage, InspectError> {
        let model = Self::resolve_model(adapter, config, model)?;
        let page = page.max(1);
        let per_page = per_page.max(1);

        let (records, total) = adapter.list_page(&model, page, per_page).await?;
        let fields = adapter.fields(&model)?;

        let id_field = adapter.id_field();
        let columns: Vec<String> = std::iter::once(id_field.to_string())
            .chain(fields)
            .unique()
            .take(MAX_TABLE_COLUMNS)
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| {
                        let value = if column == id_field {
                            serde_json::Value::String(record.id.clone())
                        } else {
                            record
                                .attributes
                                .get(column)
                                .map(json_safe)
                                .unwrap_or(serde_json::Value::Null)
                        };
                        (column.clone(), value)
                    })
                    .collect::<BTreeMap<_, _>>()
            })
            .collect();

        Ok(RecordPage {
            model,
            columns,
            rows,
            total,
            page,
            per_page,
            total_pages: total.div_ceil(per_page as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::relational::{
        AssociationDef, AssociationKind, RelationalAdapter, RelationalModel, RelationalRegistry,
    };
    use crate::model::AttrValue;
    use chrono::{TimeZone, Utc};

    fn registry_with_broken_relation() -> RelationalRegistry {
        let mut registry = RelationalRegistry::new();
        registry.register_model(RelationalModel {
            name: "Author".to_string(),
            columns: vec!["id".into(), "name".into(), "created_at".into()],
            associations: vec![
                AssociationDef {
                    name: "posts".to_string(),
                    kind: AssociationKind::HasMany,
                    class_name: "Post".to_string(),
                    foreign_key: Some("author_id".to_string()),
                    inverse_of: Some("author".to_string()),
                    join_table: None,
                },
                // misconfigured: no foreign key, every fetch fails
                AssociationDef {
                    name: "drafts".to_string(),
                    kind: AssociationKind::HasMany,
                    class_name: "Post".to_string(),
                    foreign_key: None,
                    inverse_of: None,
                    join_table: None,
                },
            ],
            abstract_class: false,
        });
        registry.register_model(RelationalModel {
            name: "Post".to_string(),
            columns: vec!["id".into(), "title".into(), "author_id".into()],
            associations: vec![AssociationDef {
                name: "author".to_string(),
                kind: AssociationKind::BelongsTo,
                class_name: "Author".to_string(),
                foreign_key: Some("author_id".to_string()),
                inverse_of: Some("posts".to_string()),
                join_table: None,
            }],
            abstract_class: false,
        });

        let author = registry.insert(
            "Author",
            BTreeMap::from([
                ("name".to_string(), AttrValue::from("ada")),
                (
                    "created_at".to_string(),
                    AttrValue::Time(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                ),
            ]),
        );
        for title in ["a", "b", "c"] {
            registry.insert(
                "Post",
                BTreeMap::from([
                    ("title".to_string(), AttrValue::from(title)),
                    ("author_id".to_string(), AttrValue::from(author.clone())),
                ]),
            );
        }
        registry
    }

    #[tokio::test]
    async fn inspection_distinguishes_the_not_found_kinds() {
        let adapter = RelationalAdapter::new(registry_with_broken_relation());
        let config = InspectorConfig::default();

        let err = InstanceInspector::inspect(&adapter, &config, "Nope", "1")
            .await
            .unwrap_err();
        assert!(matches!(err, InspectError::ModelNotFound(_)));

        let err = InstanceInspector::inspect(&adapter, &config, "Author", "999")
            .await
            .unwrap_err();
        assert!(matches!(err, InspectError::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn excluded_models_resolve_as_missing() {
        let adapter = RelationalAdapter::new(registry_with_broken_relation());
        let config = InspectorConfig {
            excluded_models: vec!["Author".to_string()],
            ..InspectorConfig::default()
        };
        let err = InstanceInspector::inspect(&adapter, &config, "Author", "1")
            .await
            .unwrap_err();
        assert!(matches!(err, InspectError::ModelNotFound(_)));
    }

    #[tokio::test]
    async fn one_broken_relation_degrades_alone() {
        let adapter = RelationalAdapter::new(registry_with_broken_relation());
        let config = InspectorConfig::default();

        let node = InstanceInspector::inspect(&adapter, &config, "Author", "1")
            .await
            .unwrap();
        assert_eq!(node.key, "Author:1");

        let posts = node.relations.iter().find(|s| s.name == "posts").unwrap();
        assert_eq!(posts.count, 3);
        assert_eq!(
            posts.preview_ids.as_deref(),
            Some(["4", "3", "2"].map(String::from).as_slice())
        );

        let drafts = node.relations.iter().find(|s| s.name == "drafts").unwrap();
        assert_eq!(drafts.count, 0);
        assert_eq!(drafts.preview_ids.as_deref(), Some([].as_slice()));
    }

    #[tokio::test]
    async fn attributes_serialize_json_safe_with_exclusions() {
        let adapter = RelationalAdapter::new(registry_with_broken_relation());
        let config = InspectorConfig::default();

        let node = InstanceInspector::inspect(&adapter, &config, "Author", "1")
            .await
            .unwrap();
        // the default exclusions strip the timestamp
        assert!(!node.attributes.contains_key("created_at"));
        assert_eq!(node.attributes["name"], serde_json::json!("ada"));

        let node = InstanceInspector::inspect(&adapter, &config, "Post", "2")
            .await
            .unwrap();
        let author = node.relations.iter().find(|s| s.name == "author").unwrap();
        assert_eq!(author.value.as_deref(), Some("1"));
        assert_eq!(author.count, 1);
        // the internal-id suffix rule strips the foreign-key column
        assert!(!node.attributes.contains_key("author_id"));
    }

    #[tokio::test]
    async fn record_pages_put_the_id_column_first() {
        let adapter = RelationalAdapter::new(registry_with_broken_relation());
        let config = InspectorConfig::default();

        let page = InstanceInspector::list_records(&adapter, &config, "Post", 1, 2)
            .await
            .unwrap();
        assert_eq!(page.columns[0], "id");
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0]["id"], serde_json::json!("4"));
        // table rows keep timestamp-ish columns that instance attributes drop
        assert!(page.columns.contains(&"author_id".to_string()));
    }
}
