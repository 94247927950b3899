//! End-to-end flows through the full router: register → token → memorial
//! CRUD → public page → condolence moderation → reactions → analytics.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use memoria_api::storage::UploadStore;
use memoria_api::{AppStateInner, ServerConfig};

async fn test_app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = memoria_db::Database::open(&dir.path().join("test.db")).unwrap();
    let store = UploadStore::new(dir.path().join("uploads")).await.unwrap();

    let state = Arc::new(AppStateInner {
        db,
        store,
        config: ServerConfig {
            jwt_secret: "test-secret".into(),
            base_url: "http://localhost:8000".into(),
            frontend_url: "http://localhost:5173".into(),
            token_expire_minutes: 30,
        },
    });

    let app = memoria_api::router(state)
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
    (app, dir)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(serde_json::to_vec(body).unwrap())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Registers `ana@example.com` and returns a bearer token.
async fn register_and_login(app: &Router) -> String {
    let (status, _) = send(
        app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            &json!({"email": "ana@example.com", "password": "secreto123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let login = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=ana%40example.com&password=secreto123"))
        .unwrap();
    let (status, body) = send(app, login).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_memorial(app: &Router, token: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/v1/memorials/",
            Some(token),
            &json!({
                "name": "Juan Pérez",
                "epitaph": "Siempre en nuestros corazones",
                "birth_date": "1950-03-15",
                "death_date": "2024-01-20"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_input() {
    let (app, _dir) = test_app().await;

    let _ = register_and_login(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            &json!({"email": "ana@example.com", "password": "otraclave99"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "El email ya está registrado");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            &json!({"email": "corta@example.com", "password": "corta"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get_request("/api/v1/memorials/", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn memorial_lifecycle_and_public_page() {
    let (app, _dir) = test_app().await;
    let token = register_and_login(&app).await;

    let memorial = create_memorial(&app, &token).await;
    let slug = memorial["slug"].as_str().unwrap().to_string();
    let id = memorial["id"].as_i64().unwrap();
    assert!(slug.starts_with("juan-perez-"));

    // Owner list has one entry.
    let (status, list) = send(&app, get_request("/api/v1/memorials/", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Public page computes the completed-years age: death month/day precedes
    // the birthday, so one year is subtracted.
    let (status, public) =
        send(&app, get_request(&format!("/api/v1/memorials/public/{}", slug), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["name"], "Juan Pérez");
    assert_eq!(public["age"], 73);

    let (status, body) =
        send(&app, get_request("/api/v1/memorials/public/no-existe", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Memorial no encontrado");

    // Update keeps the slug immutable.
    let (status, updated) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/v1/memorials/{}", id),
            Some(&token),
            &json!({"bio": "Maestro y padre de tres hijos."}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["slug"], slug.as_str());
    assert_eq!(updated["bio"], "Maestro y padre de tres hijos.");

    // QR is a PNG.
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/v1/memorials/{}/qr", slug), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let png = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

    // Delete.
    let (status, _) = send(
        &app,
        json_request("DELETE", &format!("/api/v1/memorials/{}", id), Some(&token), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) =
        send(&app, get_request(&format!("/api/v1/memorials/public/{}", slug), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn condolence_moderation_flow() {
    let (app, _dir) = test_app().await;
    let token = register_and_login(&app).await;
    let memorial = create_memorial(&app, &token).await;
    let slug = memorial["slug"].as_str().unwrap().to_string();

    // Nine characters: rejected before touching the store.
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/condolences/{}", slug),
            None,
            &json!({"author_name": "Pedro", "message": "123456789"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Ten characters: accepted, pending.
    let (status, condolence) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/condolences/{}", slug),
            None,
            &json!({"author_name": "Pedro", "author_relationship": "Amigo", "message": "1234567890"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(condolence["is_approved"], false);
    let condolence_id = condolence["id"].as_i64().unwrap();

    // Visitors see nothing yet.
    let (_, public) =
        send(&app, get_request(&format!("/api/v1/condolences/{}", slug), None)).await;
    assert_eq!(public["total"], 0);
    assert_eq!(public["pending_count"], 0);

    // The moderation view is owner-gated and counts the queue.
    let (status, _) =
        send(&app, get_request(&format!("/api/v1/condolences/manage/{}", slug), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, manage) = send(
        &app,
        get_request(&format!("/api/v1/condolences/manage/{}", slug), Some(&token)),
    )
    .await;
    assert_eq!(manage["total"], 1);
    assert_eq!(manage["pending_count"], 1);

    // Approve: leaves the pending queue, appears publicly.
    let (status, moderated) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/api/v1/condolences/{}", condolence_id),
            Some(&token),
            &json!({"is_approved": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moderated["is_approved"], true);

    let (_, manage) = send(
        &app,
        get_request(&format!("/api/v1/condolences/manage/{}", slug), Some(&token)),
    )
    .await;
    assert_eq!(manage["pending_count"], 0);

    let (_, public) =
        send(&app, get_request(&format!("/api/v1/condolences/{}", slug), None)).await;
    assert_eq!(public["total"], 1);
    assert_eq!(public["items"][0]["author_name"], "Pedro");
}

#[tokio::test]
async fn reaction_toggle_round_trip() {
    let (app, _dir) = test_app().await;
    let token = register_and_login(&app).await;
    let memorial = create_memorial(&app, &token).await;
    let slug = memorial["slug"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/analytics/reactions/{}", slug),
            None,
            &json!({"reaction_type": "candle", "visitor_id": "visitor-abc"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "added");
    assert_eq!(body["counts"]["candle"], 1);
    assert_eq!(body["user_reactions"][0], "candle");

    // Reading back as the same visitor reports the active set.
    let (_, reactions) = send(
        &app,
        get_request(
            &format!("/api/v1/analytics/reactions/{}?visitor_id=visitor-abc", slug),
            None,
        ),
    )
    .await;
    assert_eq!(reactions["counts"]["candle"], 1);
    assert_eq!(reactions["user_reactions"][0], "candle");

    // Second identical reaction removes the first.
    let (_, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/analytics/reactions/{}", slug),
            None,
            &json!({"reaction_type": "candle", "visitor_id": "visitor-abc"}),
        ),
    )
    .await;
    assert_eq!(body["action"], "removed");
    assert_eq!(body["counts"]["candle"], 0);

    let (_, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/analytics/reactions/{}", slug),
            None,
            &json!({"reaction_type": "wave", "visitor_id": "visitor-abc"}),
        ),
    )
    .await;
    assert_eq!(body["error"], "Tipo de reacción no válido");
}

#[tokio::test]
async fn visits_feed_the_dashboard() {
    let (app, _dir) = test_app().await;
    let token = register_and_login(&app).await;
    let memorial = create_memorial(&app, &token).await;
    let slug = memorial["slug"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        json_request("POST", &format!("/api/v1/analytics/visit/{}", slug), None, &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Visita registrada");

    // Unknown slugs keep the legacy 200-with-error contract.
    let (status, body) = send(
        &app,
        json_request("POST", "/api/v1/analytics/visit/no-existe", None, &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Memorial no encontrado");

    let (status, dashboard) =
        send(&app, get_request("/api/v1/analytics/dashboard", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["total_memorials"], 1);
    assert_eq!(dashboard["total_visits"], 1);

    let analytics = &dashboard["memorials_analytics"][0];
    assert_eq!(analytics["stats"]["total_visits"], 1);
    assert_eq!(analytics["stats"]["today_visits"], 1);
    // Default window charts a dense 30-day series.
    let daily = analytics["daily_visits"].as_array().unwrap();
    assert_eq!(daily.len(), 30);
    assert_eq!(daily.last().unwrap()["count"], 1);

    // Week preset densifies to exactly 7 entries.
    let (_, filtered) = send(
        &app,
        get_request(&format!("/api/v1/analytics/filtered/{}?period=week", slug), Some(&token)),
    )
    .await;
    assert_eq!(filtered["daily_visits"].as_array().unwrap().len(), 7);

    let (status, _) = send(
        &app,
        get_request(&format!("/api/v1/analytics/filtered/{}?period=quincena", slug), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // SVG chart endpoint.
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/v1/analytics/chart/{}?period=week", slug),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
    let svg = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(svg.starts_with(b"<svg"));

    // Locations: local IPs never resolve, so the breakdown stays empty.
    let (status, locations) = send(
        &app,
        get_request(&format!("/api/v1/analytics/locations/{}", slug), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(locations["locations"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn foreign_memorials_are_off_limits() {
    let (app, _dir) = test_app().await;
    let owner_token = register_and_login(&app).await;
    let memorial = create_memorial(&app, &owner_token).await;
    let id = memorial["id"].as_i64().unwrap();
    let slug = memorial["slug"].as_str().unwrap().to_string();

    // Second account.
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            &json!({"email": "otro@example.com", "password": "secreto123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let login = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=otro%40example.com&password=secreto123"))
        .unwrap();
    let (_, body) = send(&app, login).await;
    let intruder_token = body["access_token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/v1/memorials/{}", id),
            Some(&intruder_token),
            &json!({"name": "Otro"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        get_request(&format!("/api/v1/condolences/manage/{}", slug), Some(&intruder_token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Foreign analytics read as not-found rather than forbidden.
    let (status, _) = send(
        &app,
        get_request(&format!("/api/v1/analytics/filtered/{}", slug), Some(&intruder_token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
