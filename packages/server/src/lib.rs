pub mod config;
pub mod dispatch;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod telemetry;

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::config::CorsConfig;
use crate::extractors::request_id::{REQUEST_ID_HEADER, request_id_middleware};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Field Intake API",
        version = "1.0.0",
        description = "Stages per-location uploads and runs the equipment and hazard \
            analysis extractors"
    ),
    paths(
        handlers::health::health,
        handlers::upload::upload_photos,
        handlers::upload::upload_manufacturer,
        handlers::upload::upload_jha_pdfs,
        handlers::upload::upload_jha_excel,
        handlers::process::process_equipment,
        handlers::process::process_jha,
    ),
    components(schemas(common::UploadCategory)),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Uploads", description = "Staging photos, documents and spreadsheets per location"),
        (name = "Processing", description = "Running an analyzer and downloading its report"),
    ),
)]
pub struct ApiDoc;

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([REQUEST_ID_HEADER])
        .max_age(Duration::from_secs(config.max_age));

    if config.allow_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allow_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        layer.allow_origin(origins)
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server.cors);

    routes::routes(&state.config.server)
        .with_state(state)
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(cors)
}
