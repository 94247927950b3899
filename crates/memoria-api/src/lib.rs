pub mod analytics;
pub mod auth;
pub mod chart;
pub mod condolences;
pub mod dates;
pub mod error;
pub mod gallery;
pub mod geo;
pub mod memorials;
pub mod qr;
pub mod router;
pub mod slug;
pub mod state;
pub mod storage;
pub mod timeline;

pub use router::router;
pub use state::{AppState, AppStateInner, ServerConfig};
