use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;
use crate::{analytics, auth, condolences, gallery, memorials, timeline};

/// Liveness check (no auth).
pub async fn health() -> &'static str {
    "ok"
}

/// The full `/api/v1` route tree plus `/health`.
///
/// Transport-level layers (CORS, tracing, static file serving, body limits)
/// are applied by the server binary; tests drive this router directly.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/token", post(auth::token))
        .route("/users/me", get(auth::me))
        // Memorials
        .route("/memorials/", get(memorials::list_mine).post(memorials::create))
        .route("/memorials/public/{slug}", get(memorials::public_view))
        .route("/memorials/{id}", put(memorials::update).delete(memorials::remove))
        .route("/memorials/{id}/qr", get(memorials::qr_code))
        .route("/memorials/{id}/upload-photo", post(memorials::upload_photo))
        // Condolences: GET/POST key off slug, PATCH/DELETE off numeric id
        .route(
            "/condolences/manage/{slug}",
            get(condolences::list_manage),
        )
        .route(
            "/condolences/{slug}",
            get(condolences::list_public)
                .post(condolences::submit)
                .patch(condolences::moderate)
                .delete(condolences::remove),
        )
        // Gallery
        .route("/gallery/public/{slug}", get(gallery::public_gallery))
        .route(
            "/gallery/{id}",
            post(gallery::upload_media)
                .put(gallery::update_item)
                .delete(gallery::delete_item),
        )
        // Timeline
        .route("/timeline/public/{slug}", get(timeline::public_timeline))
        .route("/timeline/event-types", get(timeline::event_types))
        .route(
            "/timeline/{id}",
            post(timeline::create_event)
                .put(timeline::update_event)
                .delete(timeline::delete_event),
        )
        .route("/timeline/{id}/image", post(timeline::upload_event_image))
        // Analytics
        .route("/analytics/dashboard", get(analytics::dashboard))
        .route("/analytics/filtered/{slug}", get(analytics::filtered))
        .route("/analytics/visit/{slug}", post(analytics::register_visit))
        .route("/analytics/locations/{slug}", get(analytics::locations))
        .route("/analytics/chart/{slug}", get(analytics::chart_svg))
        .route(
            "/analytics/reactions/{slug}",
            get(analytics::get_reactions).post(analytics::toggle_reaction),
        )
        .with_state(state);

    Router::new().route("/health", get(health)).nest("/api/v1", api)
}
