use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use memoria_api::storage::UploadStore;
use memoria_api::{AppStateInner, ServerConfig};

const DEV_SECRET: &str = "dev-secret-change-me";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memoria=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("MEMORIA_JWT_SECRET").unwrap_or_else(|_| DEV_SECRET.into());
    if jwt_secret == DEV_SECRET {
        warn!("MEMORIA_JWT_SECRET is unset; using the development secret. Do not ship this.");
    }

    let host = std::env::var("MEMORIA_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("MEMORIA_PORT").unwrap_or_else(|_| "8000".into()).parse()?;
    let db_path: PathBuf =
        std::env::var("MEMORIA_DB_PATH").unwrap_or_else(|_| "memoria.db".into()).into();
    let upload_dir: PathBuf = std::env::var("MEMORIA_UPLOAD_DIR")
        .unwrap_or_else(|_| "uploaded_images".into())
        .into();
    let base_url = std::env::var("MEMORIA_BASE_URL")
        .unwrap_or_else(|_| format!("http://localhost:{}", port));
    let frontend_url =
        std::env::var("MEMORIA_FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".into());
    let token_expire_minutes: i64 = std::env::var("MEMORIA_TOKEN_EXPIRE_MINUTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);

    // Init database and upload storage
    let db = memoria_db::Database::open(&db_path)?;
    let store = UploadStore::new(upload_dir).await?;
    let static_dir = store.dir().to_path_buf();

    let state = Arc::new(AppStateInner {
        db,
        store,
        config: ServerConfig {
            jwt_secret,
            base_url,
            frontend_url,
            token_expire_minutes,
        },
    });

    // CORS — the dashboard and the public pages are served from a different
    // origin than the API.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let app = memoria_api::router(state)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(6 * 1024 * 1024)) // uploads cap at 5MB + form overhead
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Memoria server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
