use axum::Json;

use crate::models::process::HealthResponse;

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    operation_id = "health",
    summary = "Liveness check",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Backend is running",
    })
}
