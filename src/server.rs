//! HTTP server and routes.

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Maximum upload size. Book files run large; the axum default of 2 MB
/// would reject most of them.
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::opds_index))
        .route("/admin", get(handlers::admin_page))
        .route("/simple", get(handlers::simple_page))
        .route("/upload", post(handlers::upload))
        .route("/rename", post(handlers::rename))
        .route("/delete/{*filename}", post(handlers::delete))
        .route("/cover/{*filename}", get(handlers::cover))
        .route("/books/{*filename}", get(handlers::download))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
