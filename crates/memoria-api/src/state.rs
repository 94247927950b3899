use std::sync::Arc;

use memoria_db::Database;

use crate::storage::UploadStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub store: UploadStore,
    pub config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    /// Public base URL of this API, used to build absolute /static links.
    pub base_url: String,
    /// Frontend origin encoded into QR codes (`{frontend_url}/view/{slug}`).
    pub frontend_url: String,
    pub token_expire_minutes: i64,
}

impl ServerConfig {
    pub fn static_url(&self, filename: &str) -> String {
        format!("{}/static/{}", self.base_url.trim_end_matches('/'), filename)
    }
}
