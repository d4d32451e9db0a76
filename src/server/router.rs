use axum::Json;
use axum::Router;
use axum::routing::get;
use serde_json::{Value, json};

use crate::core::error::AppError;
use crate::features::governments::{
    handle_get_government, handle_get_members, handle_get_petitions,
};
use crate::server::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handle_healthcheck))
        .route("/api/governments/:uid", get(handle_get_government))
        .route("/api/governments/:uid/petitions", get(handle_get_petitions))
        .route("/api/governments/:uid/members", get(handle_get_members))
        .with_state(state)
}

pub async fn handle_healthcheck() -> Result<Json<Value>, AppError> {
    Ok(Json(json!({ "status": "ok" })))
}
