use axum::Json;
use axum::extract::{Path, Query, State};

use crate::core::error::AppError;
use crate::core::query::Record;
use crate::features::governments::dto::LookupQueryDto;
use crate::server::AppState;

/// Path segment standing in for "no uid": the currently operating government.
pub const CURRENT_ALIAS: &str = "current";

pub async fn handle_get_government(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Query(query): Query<LookupQueryDto>,
) -> Result<Json<Record>, AppError> {
    let government = state
        .governments
        .get_government_by_uid(requested_uid(&uid), query.into_options())
        .await?;
    Ok(Json(government))
}

pub async fn handle_get_petitions(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Query(query): Query<LookupQueryDto>,
) -> Result<Json<Vec<Record>>, AppError> {
    let petitions = state
        .governments
        .get_petitions_by_government_uid(requested_uid(&uid), query.into_options())
        .await?;
    Ok(Json(petitions))
}

pub async fn handle_get_members(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Query(query): Query<LookupQueryDto>,
) -> Result<Json<Vec<Record>>, AppError> {
    let members = state
        .governments
        .get_members_by_government_uid(requested_uid(&uid), query.into_options())
        .await?;
    Ok(Json(members))
}

fn requested_uid(raw: &str) -> Option<&str> {
    (raw != CURRENT_ALIAS).then_some(raw)
}
