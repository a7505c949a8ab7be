use crate::adapter::MappingAdapter;
use crate::config::InspectorConfig;
use crate::error::InspectError;
use crate::logic::inspect::InstanceInspector;
use crate::model::{node_key, ExpansionResult};
use log::warn;

/// Fetches one page of actual related records for a previously stubbed
/// relation, serializing each into a full instance node so results are
/// immediately further-expandable.
pub struct RelationExpander;

impl RelationExpander {
    pub async fn expand(
        adapter: &dyn MappingAdapter,
        config: &InspectorConfig,
        model: &str,
        id: &str,
        relation_name: &str,
        page: usize,
        per_page: Option<usize>,
    ) -> Result<ExpansionResult, InspectError> {
        let page = page.max(1);
        let per_page = per_page.unwrap_or(config.relation_limit).max(1);

        let model = InstanceInspector::resolve_model(adapter, config, model)?;
        let record = adapter.find(&model, id).await?;
        // an undeclared relation is a lookup failure, same taxonomy as an
        // unknown model
        let relation = adapter
            .relations(&model)?
            .into_iter()
            .find(|r| r.name == relation_name)
            .ok_or_else(|| InspectError::relation_not_found(&model, relation_name))?;

        let (related, total) = match adapter.fetch_related(&record, &relation, page, per_page).await
        {
            Ok(related) => {
                let total = match adapter.count_related(&record, &relation).await {
                    Ok(total) => total,
                    Err(e) => {
                        warn!("count for '{}' on {} degraded: {}", relation.name, record.key(), e);
                        0
                    }
                };
                (related, total)
            }
            Err(e) => {
                // a misbehaving relation yields an empty page, not an error;
                // the record's other relations stay explorable
                warn!("expansion of '{}' on {} degraded: {}", relation.name, record.key(), e);
                (Vec::new(), 0)
            }
        };

        let mut nodes = Vec::with_capacity(related.len());
        for item in &related {
            nodes.push(InstanceInspector::build_node(adapter, config, item).await);
        }

        Ok(ExpansionResult {
            source_key: node_key(&model, &record.id),
            relation: relation.name,
            total,
            page,
            per_page,
            has_more: ((page as u64) * (per_page as u64)) < total,
            nodes,
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
    use std::collections::BTreeMap;

    fn author_with_posts(posts: usize) -> RelationalRegistry {
        let mut registry = RelationalRegistry::new();
        registry.register_model(RelationalModel {
            name: "Author".to_string(),
            columns: vec!["id".into(), "name".into()],
            associations: vec![
                AssociationDef {
                    name: "posts".to_string(),
                    kind: AssociationKind::HasMany,
                    class_name: "Post".to_string(),
                    foreign_key: Some("author_id".to_string()),
                    inverse_of: Some("author".to_string()),
                    join_table: None,
                },
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
            BTreeMap::from([("name".to_string(), AttrValue::from("ada"))]),
        );
        for i in 0..posts {
            registry.insert(
                "Post",
                BTreeMap::from([
                    ("title".to_string(), AttrValue::from(format!("post-{}", i))),
                    ("author_id".to_string(), AttrValue::from(author.clone())),
                ]),
            );
        }
        registry
    }

    #[tokio::test]
    async fn pagination_walks_the_whole_relation_without_duplicates() {
        let adapter = RelationalAdapter::new(author_with_posts(3));
        let config = InspectorConfig::default();

        let page1 =
            RelationExpander::expand(&adapter, &config, "Author", "1", "posts", 1, Some(2))
                .await
                .unwrap();
        assert_eq!(page1.total, 3);
        assert_eq!(page1.nodes.len(), 2);
        assert!(page1.has_more);
        assert_eq!(page1.source_key, "Author:1");

        let page2 =
            RelationExpander::expand(&adapter, &config, "Author", "1", "posts", 2, Some(2))
                .await
                .unwrap();
        assert_eq!(page2.nodes.len(), 1);
        assert!(!page2.has_more);

        let mut keys: Vec<String> = page1
            .nodes
            .iter()
            .chain(page2.nodes.iter())
            .map(|n| n.key.clone())
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 3);
    }

    #[tokio::test]
    async fn expanded_nodes_carry_their_own_stubs() {
        let adapter = RelationalAdapter::new(author_with_posts(1));
        let config = InspectorConfig::default();

        let result =
            RelationExpander::expand(&adapter, &config, "Author", "1", "posts", 1, None)
                .await
                .unwrap();
        let post = &result.nodes[0];
        let back = post.relations.iter().find(|s| s.name == "author").unwrap();
        assert_eq!(back.value.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn unknown_relations_reuse_the_not_found_taxonomy() {
        let adapter = RelationalAdapter::new(author_with_posts(1));
        let config = InspectorConfig::default();

        let err = RelationExpander::expand(&adapter, &config, "Author", "1", "nope", 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, InspectError::ModelNotFound(_)));
    }

    #[tokio::test]
    async fn degraded_fetches_still_succeed_with_zero_results() {
        let adapter = RelationalAdapter::new(author_with_posts(2));
        let config = InspectorConfig::default();

        let result =
            RelationExpander::expand(&adapter, &config, "Author", "1", "drafts", 1, None)
                .await
                .unwrap();
        assert_eq!(result.total, 0);
        assert!(result.nodes.is_empty());
        assert!(!result.has_more);
    }

    #[tokio::test]
    async fn default_page_size_comes_from_configuration() {
        let adapter = RelationalAdapter::new(author_with_posts(7));
        let config = InspectorConfig {
            relation_limit: 4,
            ..InspectorConfig::default()
        };

        let result = RelationExpander::expand(&adapter, &config, "Author", "1", "posts", 1, None)
            .await
            .unwrap();
        assert_eq!(result.per_page, 4);
        assert_eq!(result.nodes.len(), 4);
        assert!(result.has_more);
    }
}
