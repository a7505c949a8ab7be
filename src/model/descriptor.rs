use crate::model::Cardinality;
use serde::{Deserialize, Serialize};

/// One node in the class-level schema graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub label: String,
    pub fields_count: usize,
    /// Counts all declared relations, including ones whose target is excluded
    /// or unknown and therefore never rendered as an edge.
    pub relations_count: usize,
}

/// One edge in the class-level schema graph, deduplicated by
/// `(source, target, label)`. Both endpoints are always eligible models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEdge {
    pub source: String,
    pub target: String,
    pub label: String,
    #[serde(rename = "type")]
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaGraph {
    pub nodes: Vec<ModelDescriptor>,
    pub edges: Vec<SchemaEdge>,
}
