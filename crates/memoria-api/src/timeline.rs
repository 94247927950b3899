use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

use memoria_db::models::TimelineEventRow;
use memoria_types::api::{
    TimelineEventCreate, TimelineEventResponse, TimelineEventUpdate, TimelineResponse,
};
use memoria_types::kinds::EventType;

use crate::auth::authenticate;
use crate::dates::parse_db_datetime;
use crate::error::{ApiError, ApiResult, memorial_not_found};
use crate::memorials::{owned_memorial, read_file_field};
use crate::state::{AppState, AppStateInner};

/// Life timeline of a memorial, chronological. Public.
pub async fn public_timeline(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<TimelineResponse>> {
    let memorial = state.db.get_memorial_by_slug(&slug)?.ok_or_else(memorial_not_found)?;
    let events = state.db.list_timeline_events(memorial.id)?;

    Ok(Json(TimelineResponse {
        memorial_id: memorial.id,
        events: events.iter().map(|e| event_response(&state, e)).collect(),
    }))
}

/// The fixed event categories with their icon and label.
pub async fn event_types() -> Json<serde_json::Value> {
    let mut types = serde_json::Map::new();
    for ty in EventType::ALL {
        types.insert(
            ty.as_str().to_string(),
            json!({ "icon": ty.icon(), "label": ty.label() }),
        );
    }
    Json(serde_json::Value::Object(types))
}

pub async fn create_event(
    State(state): State<AppState>,
    Path(memorial_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<TimelineEventCreate>,
) -> ApiResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers)?;
    let memorial = owned_memorial(&state, memorial_id, &claims)?;

    let title = req.title.trim();
    let title_len = title.chars().count();
    if title_len < 2 || title_len > 200 {
        return Err(ApiError::Validation(
            "El título debe tener entre 2 y 200 caracteres".to_string(),
        ));
    }
    if req.event_date.trim().is_empty() {
        return Err(ApiError::Validation("La fecha del evento es obligatoria".to_string()));
    }

    let event_type = parse_event_type(req.event_type.as_deref())?;

    let row = state.db.insert_timeline_event(
        memorial.id,
        title,
        req.description.as_deref(),
        req.event_date.trim(),
        event_type.as_str(),
        req.icon.as_deref(),
        req.display_order.unwrap_or(0),
    )?;

    Ok((StatusCode::CREATED, Json(event_response(&state, &row))))
}

pub async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<TimelineEventUpdate>,
) -> ApiResult<Json<TimelineEventResponse>> {
    let claims = authenticate(&state, &headers)?;
    require_event_owner(&state, event_id, claims.sub)?;

    let event_type = match req.event_type.as_deref() {
        Some(s) => Some(parse_event_type(Some(s))?),
        None => None,
    };

    let row = state
        .db
        .update_timeline_event(
            event_id,
            req.title.as_deref().map(str::trim),
            req.description.as_deref(),
            req.event_date.as_deref(),
            event_type.map(EventType::as_str),
            req.icon.as_deref(),
            req.display_order,
        )?
        .ok_or_else(|| ApiError::NotFound("Evento no encontrado".to_string()))?;

    Ok(Json(event_response(&state, &row)))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let claims = authenticate(&state, &headers)?;
    require_event_owner(&state, event_id, claims.sub)?;

    let event = state.db.get_timeline_event(event_id)?;
    state.db.delete_timeline_event(event_id)?;
    if let Some(filename) = event.and_then(|e| e.image_filename) {
        state.store.delete(&filename).await.ok();
    }

    Ok(Json(json!({ "message": "Evento eliminado" })))
}

/// Attaches (or replaces) the photo of a timeline event.
pub async fn upload_event_image(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Json<TimelineEventResponse>> {
    let claims = authenticate(&state, &headers)?;
    require_event_owner(&state, event_id, claims.sub)?;

    let previous = state.db.get_timeline_event(event_id)?.and_then(|e| e.image_filename);

    let upload = read_file_field(multipart).await?;
    let filename = state.store.save(&upload.name, &upload.data).await?;

    let row = state
        .db
        .set_timeline_event_image(event_id, &filename)?
        .ok_or_else(|| ApiError::NotFound("Evento no encontrado".to_string()))?;

    if let Some(old) = previous.as_deref() {
        state.store.delete(old).await.ok();
    }

    Ok(Json(event_response(&state, &row)))
}

fn parse_event_type(value: Option<&str>) -> ApiResult<EventType> {
    match value {
        None | Some("") => Ok(EventType::General),
        Some(s) => EventType::parse(s)
            .ok_or_else(|| ApiError::Validation("Tipo de evento no válido".to_string())),
    }
}

fn require_event_owner(state: &AppState, event_id: i64, user_id: i64) -> ApiResult<()> {
    let (_, owner_id) = state
        .db
        .timeline_event_owner(event_id)?
        .ok_or_else(|| ApiError::NotFound("Evento no encontrado".to_string()))?;
    if owner_id != user_id {
        return Err(ApiError::Forbidden(
            "No tienes permiso para editar este memorial".to_string(),
        ));
    }
    Ok(())
}

fn event_response(state: &AppStateInner, event: &TimelineEventRow) -> TimelineEventResponse {
    TimelineEventResponse {
        id: event.id,
        memorial_id: event.memorial_id,
        title: event.title.clone(),
        description: event.description.clone(),
        event_date: event.event_date.clone(),
        event_type: event.event_type.clone(),
        icon: event.icon.clone(),
        image_url: event.image_filename.as_deref().map(|f| state.config.static_url(f)),
        display_order: event.display_order,
        created_at: parse_db_datetime(&event.created_at),
    }
}
