use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapter::MappingAdapter;
use crate::config::InspectorConfig;
use crate::error::InspectError;
use crate::logic::{InstanceInspector, RelationExpander, SchemaAssembler};
use crate::model::{ExpansionResult, InstanceNode, RecordPage, SchemaGraph};

/// Shared application state: the adapter selected once at startup plus the
/// inspector configuration.
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<dyn MappingAdapter>,
    pub inspector: InspectorConfig,
}

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub paradigm: String,
    pub timestamp: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        paradigm: state.adapter.paradigm().as_str().to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InstanceResponse {
    pub node: InstanceNode,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

fn error_response(err: InspectError) -> (StatusCode, Json<ErrorResponse>) {
    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorResponse::new(&err.to_string())))
}

/// GET /api/models - list all model names
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: SchemaAssembler::model_names(state.adapter.as_ref(), &state.inspector),
    })
}

/// GET /api/schema - full schema graph (class-level)
pub async fn get_schema(State(state): State<AppState>) -> Json<SchemaGraph> {
    Json(SchemaAssembler::assemble(state.adapter.as_ref(), &state.inspector))
}

/// GET /api/models/:model_name/records - paginated table view
pub async fn list_records(
    State(state): State<AppState>,
    Path(model_name): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<RecordPage>, (StatusCode, Json<ErrorResponse>)> {
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(state.inspector.records_per_page);
    InstanceInspector::list_records(state.adapter.as_ref(), &state.inspector, &model_name, page, per_page)
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /api/models/:model_name/:id - instance node with lazy relation stubs
pub async fn get_instance(
    State(state): State<AppState>,
    Path((model_name, id)): Path<(String, String)>,
) -> Result<Json<InstanceResponse>, (StatusCode, Json<ErrorResponse>)> {
    InstanceInspector::inspect(state.adapter.as_ref(), &state.inspector, &model_name, &id)
        .await
        .map(|node| Json(InstanceResponse { node }))
        .map_err(error_response)
}

/// GET /api/models/:model_name/:id/relations/:relation_name - expand a relation
pub async fn expand_relation(
    State(state): State<AppState>,
    Path((model_name, id, relation_name)): Path<(String, String, String)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ExpansionResult>, (StatusCode, Json<ErrorResponse>)> {
    RelationExpander::expand(
        state.adapter.as_ref(),
        &state.inspector,
        &model_name,
        &id,
        &relation_name,
        query.page.unwrap_or(1),
        query.per_page,
    )
    .await
    .map(Json)
    .map_err(error_response)
}
