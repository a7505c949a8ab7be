use axum::{routing::get, Router};

use crate::api::handlers::{self, AppState};

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Reflection endpoints
        .route("/api/models", get(handlers::list_models))
        .route("/api/schema", get(handlers::get_schema))
        .route("/api/models/:model_name/records", get(handlers::list_records))
        .route("/api/models/:model_name/:id", get(handlers::get_instance))
        .route(
            "/api/models/:model_name/:id/relations/:relation_name",
            get(handlers::expand_relation),
        )
}
