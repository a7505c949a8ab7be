use crate::adapter::MappingAdapter;
use crate::config::InspectorConfig;
use crate::model::{ModelDescriptor, SchemaEdge, SchemaGraph};
use itertools::Itertools;
use log::warn;
use std::collections::HashSet;

/// Walks all eligible model classes once and builds the class-level graph.
pub struct SchemaAssembler;

impl SchemaAssembler {
    /// Eligible model names with configured exclusions applied, in
    /// lexicographic order for stable client rendering and caching.
    pub fn model_names(adapter: &dyn MappingAdapter, config: &InspectorConfig) -> Vec<String> {
        adapter
            .model_names()
            .into_iter()
            .filter(|name| !config.is_excluded_model(name))
            .sorted()
            .collect()
    }

    pub fn assemble(adapter: &dyn MappingAdapter, config: &InspectorConfig) -> SchemaGraph {
        let names = Self::model_names(adapter, config);
        let eligible: HashSet<&str> = names.iter().map(String::as_str).collect();

        let mut nodes = Vec::with_capacity(names.len());
        let mut edges = Vec::new();
        let mut seen_edges = HashSet::new();

        for name in &names {
            // one broken class never aborts the walk; it is simply absent
            let fields = match adapter.fields(name) {
                Ok(fields) => fields,
                Err(e) => {
                    warn!("schema: skipping {}: {}", name, e);
                    continue;
                }
            };
            let relations = match adapter.relations(name) {
                Ok(relations) => relations,
                Err(e) => {
                    warn!("schema: skipping {}: {}", name, e);
                    continue;
                }
            };

            nodes.push(ModelDescriptor {
                id: name.clone(),
                label: name.clone(),
                fields_count: fields.len(),
                // counts every declared relation, renderable or not
                relations_count: relations.len(),
            });

            for relation in &relations {
                if !eligible.contains(relation.target_class.as_str()) {
                    continue;
                }
                let key = (name.clone(), relation.target_class.clone(), relation.name.clone());
                if !seen_edges.insert(key) {
                    continue;
                }
                edges.push(SchemaEdge {
                    source: name.clone(),
                    target: relation.target_class.clone(),
                    label: relation.name.clone(),
                    cardinality: relation.cardinality,
                });
            }
        }

        SchemaGraph { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Paradigm;
    use crate::error::InspectError;
    use crate::model::{Cardinality, Record, RelationDescriptor};
    use anyhow::anyhow;

    /// Metadata-only adapter with one model whose reflection always fails.
    struct PartiallyBrokenAdapter;

    fn descriptor(name: &str, target: &str) -> RelationDescriptor {
        RelationDescriptor {
            name: name.to_string(),
            target_class: target.to_string(),
            cardinality: Cardinality::HasMany,
            foreign_key: Some("owner_id".to_string()),
            inverse_of: None,
            is_embedded: false,
        }
    }

    #[async_trait::async_trait]
    impl MappingAdapter for PartiallyBrokenAdapter {
        fn paradigm(&self) -> Paradigm {
            Paradigm::Relational
        }

        fn id_field(&self) -> &'static str {
            "id"
        }

        fn model_names(&self) -> Vec<String> {
            vec!["Broken".to_string(), "Author".to_string(), "Post".to_string()]
        }

        fn fields(&self, model: &str) -> Result<Vec<String>, InspectError> {
            if model == "Broken" {
                return Err(InspectError::Internal(anyhow!("reflection blew up")));
            }
            Ok(vec!["id".to_string(), "name".to_string()])
        }

        fn relations(&self, model: &str) -> Result<Vec<RelationDescriptor>, InspectError> {
            Ok(match model {
                // duplicate declarations collapse to one edge; targets outside
                // the reflected set render no edge at all
                "Author" => vec![
                    descriptor("posts", "Post"),
                    descriptor("posts", "Post"),
                    descriptor("ghosts", "Ghost"),
                ],
                _ => Vec::new(),
            })
        }

        async fn find(&self, model: &str, id: &str) -> Result<Record, InspectError> {
            Err(InspectError::record_not_found(model, id))
        }

        async fn list_page(
            &self,
            _model: &str,
            _page: usize,
            _per_page: usize,
        ) -> Result<(Vec<Record>, u64), InspectError> {
            Ok((Vec::new(), 0))
        }

        async fn fetch_related(
            &self,
            _record: &Record,
            _relation: &RelationDescriptor,
            _page: usize,
            _per_page: usize,
        ) -> Result<Vec<Record>, InspectError> {
            Ok(Vec::new())
        }

        async fn count_related(
            &self,
            _record: &Record,
            _relation: &RelationDescriptor,
        ) -> Result<u64, InspectError> {
            Ok(0)
        }
    }

    #[test]
    fn broken_models_are_skipped_not_fatal() {
        let graph = SchemaAssembler::assemble(&PartiallyBrokenAdapter, &InspectorConfig::default());
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["Author", "Post"]);
    }

    #[test]
    fn edges_are_deduplicated_and_endpoint_closed() {
        let graph = SchemaAssembler::assemble(&PartiallyBrokenAdapter, &InspectorConfig::default());
        assert_eq!(graph.edges.len(), 1);
        let edge = &graph.edges[0];
        assert_eq!((edge.source.as_str(), edge.target.as_str(), edge.label.as_str()),
                   ("Author", "Post", "posts"));

        // the dropped and duplicated declarations still count on the node
        let author = graph.nodes.iter().find(|n| n.id == "Author").unwrap();
        assert_eq!(author.relations_count, 3);
    }

    #[test]
    fn excluded_models_disappear_from_nodes_and_edges() {
        let config = InspectorConfig {
            excluded_models: vec!["Post".to_string()],
            ..InspectorConfig::default()
        };
        let graph = SchemaAssembler::assemble(&PartiallyBrokenAdapter, &config);
        assert!(graph.nodes.iter().all(|n| n.id != "Post"));
        assert!(graph.edges.is_empty());
        // the unrendered relation still counts
        let author = graph.nodes.iter().find(|n| n.id == "Author").unwrap();
        assert_eq!(author.relations_count, 3);
    }
}
