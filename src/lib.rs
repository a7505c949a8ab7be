pub mod adapter;
pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;

// Export API types
pub use api::handlers::AppState;
pub use api::routes;

// Export adapter types
pub use adapter::{detect, DocumentAdapter, HostMapping, MappingAdapter, Paradigm, RelationalAdapter};

// Export error taxonomy
pub use error::{AdapterDetectionError, InspectError, SnapshotError};

// Export engine types
pub use logic::{
    GraphSession, GraphState, InstanceInspector, RelationExpander, SchemaAssembler,
};

// Export all model types
pub use model::*;

// Function for integration testing and embedding hosts
pub async fn run_server(host: HostMapping) -> anyhow::Result<()> {
    use axum::serve;
    use tokio::net::TcpListener;

    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with INFO level only (suppress DEBUG logs)
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    // Load configuration
    let config = crate::config::AppConfig::load()?;

    // Detect the host's mapping layer once; fatal if neither is present
    let adapter = crate::adapter::detect(host)?;

    let state = AppState {
        adapter,
        inspector: config.inspector.clone(),
    };

    // Create router with state
    let app = crate::api::routes::create_router().with_state(state);

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;

    serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::model::{GraphSnapshot, InstanceNode, RelationStub};

    #[test]
    fn test_expansion_result_wire_shape() {
        use crate::model::{Cardinality, ExpansionResult};

        let result = ExpansionResult {
            source_key: "Author:a1".to_string(),
            relation: "posts".to_string(),
            total: 3,
            page: 1,
            per_page: 2,
            has_more: true,
            nodes: vec![InstanceNode {
                key: "Post:p1".to_string(),
                model: "Post".to_string(),
                record_id: "p1".to_string(),
                attributes: Default::default(),
                relations: vec![RelationStub {
                    name: "author".to_string(),
                    cardinality: Cardinality::BelongsTo,
                    target_class: "Author".to_string(),
                    foreign_key: Some("author_id".to_string()),
                    is_embedded: false,
                    value: Some("a1".to_string()),
                    count: 1,
                    preview_ids: None,
                }],
            }],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["has_more"], true);
        assert_eq!(json["nodes"][0]["key"], "Post:p1");
        assert_eq!(json["nodes"][0]["relations"][0]["cardinality"], "belongs_to");
        // round-trips through the same shape
        let parsed: ExpansionResult = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_snapshot_rejects_unknown_versions() {
        use crate::logic::GraphState;

        let json = serde_json::json!({
            "version": 3,
            "timestamp": "2024-01-01T00:00:00Z",
            "root": null,
            "nodes": [],
            "expandedRelations": [],
            "edges": []
        });
        let snapshot: GraphSnapshot = serde_json::from_value(json).unwrap();
        assert!(GraphState::import(snapshot).is_err());
    }

    #[test]
    fn test_schema_edge_serializes_type_field() {
        use crate::model::{Cardinality, SchemaEdge};

        let edge = SchemaEdge {
            source: "Author".to_string(),
            target: "Post".to_string(),
            label: "posts".to_string(),
            cardinality: Cardinality::HasMany,
        };
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "has_many");
        assert!(json.get("cardinality").is_none());
    }
}
