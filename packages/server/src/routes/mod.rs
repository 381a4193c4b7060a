use axum::{
    Router,
    routing::{get, post},
};

use crate::config::ServerConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::health::health))
        .nest("/api", api_routes(config))
}

fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .nest("/upload", upload_routes(config))
        .route("/process", post(handlers::process::process_equipment))
        .route("/jhaprocess/{location}", post(handlers::process::process_jha))
}

fn upload_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .route("/photos/{location}", post(handlers::upload::upload_photos))
        .route(
            "/manufacturer/{location}",
            post(handlers::upload::upload_manufacturer),
        )
        .route("/jha/{location}/pdfs", post(handlers::upload::upload_jha_pdfs))
        .route("/jha/{location}/excel", post(handlers::upload::upload_jha_excel))
        .layer(handlers::upload::upload_body_limit(config.max_upload_bytes))
}
