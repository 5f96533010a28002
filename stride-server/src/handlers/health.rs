use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::infra::app_state::AppState;

/// Liveness plus the storage backend in use
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let mut body = json!({
        "status": "ok",
        "backend": state.backend.as_str(),
    });

    if let Some(postgres) = &state.postgres {
        let stats = postgres.pool_stats();
        body["pool"] = json!({
            "size": stats.size,
            "idle": stats.idle,
            "max_size": stats.max_size,
        });
    }

    Json(body)
}
