use axum::extract::{Path, State};
use axum::response::Response;
use runner::PipelineKind;
use tracing::{info, instrument};

use crate::dispatch::deliver_outcome;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::request_id::RequestId;
use crate::models::process::ProcessRequest;
use crate::state::AppState;

async fn run_and_deliver(
    state: &AppState,
    location: &str,
    kind: PipelineKind,
    request_id: RequestId,
) -> Result<Response, AppError> {
    info!(location, pipeline = %kind, "Processing request received");
    let outcome = state.runner.run(location, kind, request_id.0).await?;
    deliver_outcome(state.store.clone(), outcome).await
}

#[utoipa::path(
    post,
    path = "/api/process",
    tag = "Processing",
    operation_id = "processEquipment",
    summary = "Build the equipment inventory report",
    description = "Runs the equipment analyzer over the staged photos and manufacturer sheet \
        and streams back `equipment_report_{location}.csv`. The result is deleted after delivery.",
    request_body = ProcessRequest,
    responses(
        (status = 200, description = "CSV report", content_type = "text/csv", body = Vec<u8>),
        (status = 400, description = "Missing location or inputs", body = ErrorBody),
        (
            status = 500,
            description = "Analyzer failure, timeout or missing result",
            body = ErrorBody
        ),
    ),
)]
#[instrument(skip(state, request_id, body), fields(request_id = request_id.0))]
pub async fn process_equipment(
    State(state): State<AppState>,
    request_id: RequestId,
    AppJson(body): AppJson<ProcessRequest>,
) -> Result<Response, AppError> {
    let location = body
        .location_number
        .map(|l| l.into_string())
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| AppError::validation("Location number is required"))?;
    run_and_deliver(&state, &location, PipelineKind::Equipment, request_id).await
}

#[utoipa::path(
    post,
    path = "/api/jhaprocess/{location}",
    tag = "Processing",
    operation_id = "processHazardAnalysis",
    summary = "Build the job hazard analysis workbook",
    description = "Runs the hazard analyzer over every document staged for the location and \
        streams back `jha_processed.xlsx`. The result is deleted after delivery.",
    params(("location" = String, Path, description = "Location identifier")),
    responses(
        (status = 200, description = "Workbook", body = Vec<u8>,
            content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "Invalid location or no documents", body = ErrorBody),
        (
            status = 500,
            description = "Analyzer failure, timeout or missing result",
            body = ErrorBody
        ),
    ),
)]
#[instrument(skip(state, request_id), fields(request_id = request_id.0))]
pub async fn process_jha(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(location): Path<String>,
) -> Result<Response, AppError> {
    run_and_deliver(&state, &location, PipelineKind::HazardAnalysis, request_id).await
}
