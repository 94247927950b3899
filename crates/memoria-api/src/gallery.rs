use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use memoria_db::models::MediaItemRow;
use memoria_types::api::{GalleryResponse, MediaItemResponse, MediaItemUpdate};

use crate::auth::authenticate;
use crate::dates::parse_db_datetime;
use crate::error::{ApiError, ApiResult, memorial_not_found};
use crate::memorials::owned_memorial;
use crate::state::{AppState, AppStateInner};
use crate::storage::MAX_UPLOAD_BYTES;

/// Gallery of a memorial, display order then newest. Public.
pub async fn public_gallery(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<GalleryResponse>> {
    let memorial = state.db.get_memorial_by_slug(&slug)?.ok_or_else(memorial_not_found)?;
    let items = state.db.list_media_items(memorial.id)?;

    Ok(Json(GalleryResponse {
        memorial_id: memorial.id,
        items: items.iter().map(|i| media_response(&state, i)).collect(),
    }))
}

/// Multipart upload: a `file` part plus optional descriptive text parts.
pub async fn upload_media(
    State(state): State<AppState>,
    Path(memorial_id): Path<i64>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers)?;
    let memorial = owned_memorial(&state, memorial_id, &claims)?;

    let mut file: Option<(String, Option<String>, bytes::Bytes)> = None;
    let mut title = None;
    let mut caption = None;
    let mut taken_at = None;
    let mut location = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Archivo no válido".to_string()))?
    {
        let part = field.name().map(str::to_string);
        match part.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::Validation("Archivo no válido".to_string()))?;
                if data.len() > MAX_UPLOAD_BYTES {
                    return Err(ApiError::Validation("El archivo supera los 5MB".to_string()));
                }
                file = Some((name, content_type, data));
            }
            Some("title") => title = read_text(field).await?,
            Some("caption") => caption = read_text(field).await?,
            Some("taken_at") => taken_at = read_text(field).await?,
            Some("location") => location = read_text(field).await?,
            _ => {}
        }
    }

    let (original_name, content_type, data) =
        file.ok_or_else(|| ApiError::Validation("Falta el archivo".to_string()))?;

    let media_type = match content_type.as_deref() {
        Some(mime) if mime.starts_with("video/") => "video",
        _ => "image",
    };

    let filename = state.store.save(&original_name, &data).await?;
    let row = state.db.insert_media_item(
        memorial.id,
        &filename,
        Some(&original_name),
        media_type,
        content_type.as_deref(),
        Some(data.len() as i64),
        title.as_deref(),
        caption.as_deref(),
        taken_at.as_deref(),
        location.as_deref(),
    )?;

    Ok((StatusCode::CREATED, Json(media_response(&state, &row))))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<MediaItemUpdate>,
) -> ApiResult<Json<MediaItemResponse>> {
    let claims = authenticate(&state, &headers)?;
    require_item_owner(&state, item_id, claims.sub)?;

    let row = state
        .db
        .update_media_item(
            item_id,
            req.title.as_deref(),
            req.caption.as_deref(),
            req.taken_at.as_deref(),
            req.location.as_deref(),
            req.display_order,
            req.is_featured,
        )?
        .ok_or_else(|| ApiError::NotFound("Elemento no encontrado".to_string()))?;

    Ok(Json(media_response(&state, &row)))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let claims = authenticate(&state, &headers)?;
    require_item_owner(&state, item_id, claims.sub)?;

    let item = state
        .db
        .get_media_item(item_id)?
        .ok_or_else(|| ApiError::NotFound("Elemento no encontrado".to_string()))?;

    state.db.delete_media_item(item_id)?;
    state.store.delete(&item.filename).await.ok();

    Ok(Json(serde_json::json!({ "message": "Elemento eliminado" })))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ApiResult<Option<String>> {
    let text = field
        .text()
        .await
        .map_err(|_| ApiError::Validation("Campo no válido".to_string()))?;
    let text = text.trim().to_string();
    Ok(if text.is_empty() { None } else { Some(text) })
}

fn require_item_owner(state: &AppState, item_id: i64, user_id: i64) -> ApiResult<()> {
    let (_, owner_id) = state
        .db
        .media_item_owner(item_id)?
        .ok_or_else(|| ApiError::NotFound("Elemento no encontrado".to_string()))?;
    if owner_id != user_id {
        return Err(ApiError::Forbidden(
            "No tienes permiso para editar este memorial".to_string(),
        ));
    }
    Ok(())
}

fn media_response(state: &AppStateInner, item: &MediaItemRow) -> MediaItemResponse {
    MediaItemResponse {
        id: item.id,
        memorial_id: item.memorial_id,
        url: state.config.static_url(&item.filename),
        media_type: item.media_type.clone(),
        mime_type: item.mime_type.clone(),
        title: item.title.clone(),
        caption: item.caption.clone(),
        taken_at: item.taken_at.clone(),
        location: item.location.clone(),
        display_order: item.display_order,
        is_featured: item.is_featured,
        created_at: parse_db_datetime(&item.created_at),
    }
}
