use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};

use memoria_db::models::MemorialRow;
use memoria_types::api::{Claims, MemorialCreate, MemorialResponse, MemorialUpdate, PublicMemorial};

use crate::auth::authenticate;
use crate::dates::{age_in_years, parse_db_datetime};
use crate::error::{ApiError, ApiResult, memorial_not_found};
use crate::slug::memorial_slug;
use crate::state::{AppState, AppStateInner};
use crate::qr;
use crate::storage::MAX_UPLOAD_BYTES;

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<MemorialCreate>,
) -> ApiResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers)?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("El nombre es obligatorio".to_string()));
    }

    // Random suffixes make collisions unlikely, but the slug is the public
    // identifier forever, so retry rather than surface a constraint error.
    let mut slug = memorial_slug(name);
    for _ in 0..3 {
        if !state.db.slug_exists(&slug)? {
            break;
        }
        slug = memorial_slug(name);
    }

    let memorial = state.db.create_memorial(
        claims.sub,
        &slug,
        name,
        req.epitaph.as_deref(),
        req.bio.as_deref(),
        req.birth_date.as_deref(),
        req.death_date.as_deref(),
    )?;

    Ok((StatusCode::CREATED, Json(memorial_response(&state, &memorial))))
}

pub async fn list_mine(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<MemorialResponse>>> {
    let claims = authenticate(&state, &headers)?;
    let memorials = state.db.list_memorials_by_owner(claims.sub)?;
    Ok(Json(memorials.iter().map(|m| memorial_response(&state, m)).collect()))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<MemorialUpdate>,
) -> ApiResult<Json<MemorialResponse>> {
    let claims = authenticate(&state, &headers)?;
    let memorial = owned_memorial(&state, id, &claims)?;

    if let Some(name) = req.name.as_deref() {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("El nombre es obligatorio".to_string()));
        }
    }

    let updated = state
        .db
        .update_memorial(
            memorial.id,
            req.name.as_deref().map(str::trim),
            req.epitaph.as_deref(),
            req.bio.as_deref(),
            req.birth_date.as_deref(),
            req.death_date.as_deref(),
        )?
        .ok_or_else(memorial_not_found)?;

    Ok(Json(memorial_response(&state, &updated)))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let claims = authenticate(&state, &headers)?;
    let memorial = owned_memorial(&state, id, &claims)?;

    // Row cascade removes condolences, media, timeline, reactions, visits.
    state.db.delete_memorial(memorial.id)?;

    // The cover image is orphaned otherwise; gallery files are handled by
    // their own delete endpoint before a memorial is normally removed.
    if let Some(filename) = memorial.image_filename.as_deref() {
        state.store.delete(filename).await.ok();
    }

    Ok(Json(serde_json::json!({ "message": "Memorial eliminado" })))
}

/// Unauthenticated view keyed by slug. Also computes the displayed age.
pub async fn public_view(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<PublicMemorial>> {
    let memorial = state.db.get_memorial_by_slug(&slug)?.ok_or_else(memorial_not_found)?;

    let age = match (memorial.birth_date.as_deref(), memorial.death_date.as_deref()) {
        (Some(birth), Some(death)) => age_in_years(birth, death),
        _ => None,
    };

    Ok(Json(PublicMemorial {
        name: memorial.name,
        epitaph: memorial.epitaph,
        bio: memorial.bio,
        birth_date: memorial.birth_date,
        death_date: memorial.death_date,
        image_url: memorial
            .image_filename
            .as_deref()
            .map(|f| state.config.static_url(f)),
        age,
    }))
}

/// PNG QR for a memorial's public page. Owner only; the code itself is
/// world-scannable but generating it is a dashboard operation.
pub async fn qr_code(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers)?;
    let memorial = state.db.get_memorial_by_slug(&slug)?.ok_or_else(memorial_not_found)?;
    if memorial.owner_id != claims.sub {
        return Err(ApiError::Forbidden(
            "No tienes permiso para editar este memorial".to_string(),
        ));
    }

    let png = qr::memorial_qr_png(&state.config.frontend_url, &memorial.slug)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// Replaces the memorial's cover photo.
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Json<MemorialResponse>> {
    let claims = authenticate(&state, &headers)?;
    let memorial = owned_memorial(&state, id, &claims)?;

    let upload = read_file_field(multipart).await?;
    let filename = state.store.save(&upload.name, &upload.data).await?;

    let previous = memorial.image_filename.clone();
    let updated = state
        .db
        .set_memorial_image(memorial.id, &filename)?
        .ok_or_else(memorial_not_found)?;

    if let Some(old) = previous.as_deref() {
        state.store.delete(old).await.ok();
    }

    Ok(Json(memorial_response(&state, &updated)))
}

// ── Shared helpers ──────────────────────────────────────────────────────

pub(crate) struct FileUpload {
    pub name: String,
    pub data: bytes::Bytes,
}

/// Pulls the `file` part out of a multipart body, enforcing the size cap.
pub(crate) async fn read_file_field(mut multipart: Multipart) -> ApiResult<FileUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Archivo no válido".to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|_| ApiError::Validation("Archivo no válido".to_string()))?;

        if data.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::Validation("El archivo supera los 5MB".to_string()));
        }

        return Ok(FileUpload { name, data });
    }

    Err(ApiError::Validation("Falta el archivo".to_string()))
}

/// Memorial by id with the ownership check every mutation shares.
pub(crate) fn owned_memorial(
    state: &AppStateInner,
    id: i64,
    claims: &Claims,
) -> ApiResult<MemorialRow> {
    let memorial = state.db.get_memorial(id)?.ok_or_else(memorial_not_found)?;
    if memorial.owner_id != claims.sub {
        return Err(ApiError::Forbidden(
            "No tienes permiso para editar este memorial".to_string(),
        ));
    }
    Ok(memorial)
}

pub(crate) fn memorial_response(state: &AppStateInner, m: &MemorialRow) -> MemorialResponse {
    MemorialResponse {
        id: m.id,
        slug: m.slug.clone(),
        name: m.name.clone(),
        epitaph: m.epitaph.clone(),
        bio: m.bio.clone(),
        birth_date: m.birth_date.clone(),
        death_date: m.death_date.clone(),
        image_url: m.image_filename.as_deref().map(|f| state.config.static_url(f)),
        owner_id: m.owner_id,
        created_at: parse_db_datetime(&m.created_at),
    }
}
