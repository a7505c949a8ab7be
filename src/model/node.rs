use crate::model::Cardinality;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lightweight relation summary attached to an instance node: a count and a
/// bounded preview instead of materialized related records. Best-effort by
/// contract: a failed fetch degrades to `count: 0` rather than failing the
/// whole instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationStub {
    pub name: String,
    pub cardinality: Cardinality,
    pub target_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
    pub is_embedded: bool,
    /// Related identifier, to-one relations only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub count: u64,
    /// First identifiers of a to-many relation, bounded by the configured
    /// relation limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_ids: Option<Vec<String>>,
}

/// A serialized record plus its relation stubs. `key` is the stable identity
/// used for deduplication across the whole explored subgraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceNode {
    pub key: String,
    pub model: String,
    pub record_id: String,
    pub attributes: BTreeMap<String, serde_json::Value>,
    pub relations: Vec<RelationStub>,
}

/// One page of related records for a previously stubbed relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionResult {
    pub source_key: String,
    pub relation: String,
    pub total: u64,
    pub page: usize,
    pub per_page: usize,
    pub has_more: bool,
    pub nodes: Vec<InstanceNode>,
}

/// One page of a model's records for the table view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPage {
    pub model: String,
    pub columns: Vec<String>,
    pub rows: Vec<BTreeMap<String, serde_json::Value>>,
    pub total: u64,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_omits_unset_optional_fields() {
        let stub = RelationStub {
            name: "author".to_string(),
            cardinality: Cardinality::BelongsTo,
            target_class: "Author".to_string(),
            foreign_key: Some("author_id".to_string()),
            is_embedded: false,
            value: None,
            count: 0,
            preview_ids: None,
        };
        let json = serde_json::to_string(&stub).unwrap();
        assert!(!json.contains("\"value\""));
        assert!(!json.contains("\"preview_ids\""));
        assert!(json.contains("\"foreign_key\":\"author_id\""));
    }

    #[test]
    fn degraded_to_many_stub_keeps_empty_preview_list() {
        let stub = RelationStub {
            name: "posts".to_string(),
            cardinality: Cardinality::HasMany,
            target_class: "Post".to_string(),
            foreign_key: Some("author_id".to_string()),
            is_embedded: false,
            value: None,
            count: 0,
            preview_ids: Some(Vec::new()),
        };
        let json = serde_json::to_value(&stub).unwrap();
        assert_eq!(json["preview_ids"], serde_json::json!([]));
        assert_eq!(json["count"], 0);
    }
}
