use axum::{
    Json,
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use std::net::SocketAddr;

use memoria_db::models::CondolenceRow;
use memoria_types::api::{
    CondolenceCreate, CondolenceListResponse, CondolenceResponse, CondolenceUpdate,
};

use crate::auth::authenticate;
use crate::dates::parse_db_datetime;
use crate::error::{ApiError, ApiResult, memorial_not_found};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Approved condolences of a memorial, featured first. Public.
pub async fn list_public(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<CondolenceListResponse>> {
    let memorial = state.db.get_memorial_by_slug(&slug)?.ok_or_else(memorial_not_found)?;

    let (rows, total) = state.db.list_condolences(
        memorial.id,
        true,
        query.limit.clamp(1, 100),
        query.offset.max(0),
    )?;

    Ok(Json(CondolenceListResponse {
        items: rows.iter().map(condolence_response).collect(),
        total,
        pending_count: 0,
    }))
}

/// Anonymous submission; lands in the moderation queue unapproved.
pub async fn submit(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<CondolenceCreate>,
) -> ApiResult<impl IntoResponse> {
    let memorial = state.db.get_memorial_by_slug(&slug)?.ok_or_else(memorial_not_found)?;

    let author_name = req.author_name.trim();
    let name_len = author_name.chars().count();
    if name_len < 2 || name_len > 100 {
        return Err(ApiError::Validation(
            "El nombre debe tener entre 2 y 100 caracteres".to_string(),
        ));
    }

    let message = req.message.trim();
    let message_len = message.chars().count();
    if message_len < 10 || message_len > 2000 {
        return Err(ApiError::Validation(
            "El mensaje debe tener entre 10 y 2000 caracteres".to_string(),
        ));
    }

    if let Some(relationship) = req.author_relationship.as_deref() {
        if relationship.chars().count() > 100 {
            return Err(ApiError::Validation("La relación es demasiado larga".to_string()));
        }
    }

    let ip = addr.ip().to_string();
    let row = state.db.insert_condolence(
        memorial.id,
        author_name,
        req.author_email.as_deref(),
        req.author_relationship.as_deref(),
        message,
        req.visitor_id.as_deref(),
        Some(&ip),
    )?;

    Ok((StatusCode::CREATED, Json(condolence_response(&row))))
}

/// Full list including the pending queue. Owner only.
pub async fn list_manage(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<CondolenceListResponse>> {
    let claims = authenticate(&state, &headers)?;
    let memorial = state.db.get_memorial_by_slug(&slug)?.ok_or_else(memorial_not_found)?;
    if memorial.owner_id != claims.sub {
        return Err(ApiError::Forbidden(
            "No tienes permiso para ver estas condolencias".to_string(),
        ));
    }

    let (rows, total) = state.db.list_condolences(
        memorial.id,
        false,
        query.limit.clamp(1, 100),
        query.offset.max(0),
    )?;
    let pending_count = state.db.pending_condolence_count(memorial.id)?;

    Ok(Json(CondolenceListResponse {
        items: rows.iter().map(condolence_response).collect(),
        total,
        pending_count,
    }))
}

/// Approve / feature toggles. Owner only.
pub async fn moderate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<CondolenceUpdate>,
) -> ApiResult<Json<CondolenceResponse>> {
    let claims = authenticate(&state, &headers)?;
    require_condolence_owner(&state, id, claims.sub, "No tienes permiso para moderar esta condolencia")?;

    let row = state
        .db
        .moderate_condolence(id, req.is_approved, req.is_featured)?
        .ok_or_else(|| ApiError::NotFound("Condolencia no encontrada".to_string()))?;

    Ok(Json(condolence_response(&row)))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let claims = authenticate(&state, &headers)?;
    require_condolence_owner(&state, id, claims.sub, "No tienes permiso para eliminar esta condolencia")?;

    state.db.delete_condolence(id)?;
    Ok(Json(serde_json::json!({ "message": "Condolencia eliminada" })))
}

fn require_condolence_owner(
    state: &AppState,
    condolence_id: i64,
    user_id: i64,
    denial: &str,
) -> ApiResult<()> {
    let (_, owner_id) = state
        .db
        .condolence_owner(condolence_id)?
        .ok_or_else(|| ApiError::NotFound("Condolencia no encontrada".to_string()))?;
    if owner_id != user_id {
        return Err(ApiError::Forbidden(denial.to_string()));
    }
    Ok(())
}

fn condolence_response(row: &CondolenceRow) -> CondolenceResponse {
    CondolenceResponse {
        id: row.id,
        memorial_id: row.memorial_id,
        author_name: row.author_name.clone(),
        author_relationship: row.author_relationship.clone(),
        message: row.message.clone(),
        is_approved: row.is_approved,
        is_featured: row.is_featured,
        created_at: parse_db_datetime(&row.created_at),
    }
}
