use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use common::{IncomingFile, UploadCategory};
use tracing::{debug, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::request_id::RequestId;
use crate::models::upload::{BatchUploadResponse, SheetUploadResponse};
use crate::state::AppState;

pub fn upload_body_limit(max_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_bytes)
}

/// Read every file part whose field name is in `fields`; other parts are
/// ignored.
async fn collect_files(
    multipart: Result<Multipart, MultipartRejection>,
    fields: &[&str],
) -> Result<Vec<IncomingFile>, AppError> {
    let mut multipart =
        multipart.map_err(|e| AppError::validation(format!("Multipart error: {}", e.body_text())))?;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let wanted = field.name().is_some_and(|name| fields.contains(&name));
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if !wanted {
            debug!(field = ?field.name(), "Ignoring multipart field");
            continue;
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read '{filename}': {e}")))?;
        files.push(IncomingFile::new(filename, data.to_vec()));
    }
    Ok(files)
}

async fn ingest_batch(
    state: &AppState,
    location: &str,
    category: UploadCategory,
    files: Vec<IncomingFile>,
    message: &str,
) -> Result<Json<BatchUploadResponse>, AppError> {
    let report = state.ingestor.ingest(location, category, files).await?;
    Ok(Json(BatchUploadResponse::new(report, message)))
}

async fn ingest_sheet(
    state: &AppState,
    location: &str,
    category: UploadCategory,
    files: Vec<IncomingFile>,
    message: Option<&str>,
) -> Result<Json<SheetUploadResponse>, AppError> {
    let report = state.ingestor.ingest(location, category, files).await?;
    Ok(Json(SheetUploadResponse::new(report, message)))
}

#[utoipa::path(
    post,
    path = "/api/upload/photos/{location}",
    tag = "Uploads",
    operation_id = "uploadPhotos",
    summary = "Stage equipment photos",
    description = "Stores every `photos[]` (or `photos`) part under the location. \
        A name that is already staged is reported under `skipped` and left untouched.",
    params(("location" = String, Path, description = "Location identifier")),
    request_body(content_type = "multipart/form-data", description = "One or more photo files"),
    responses(
        (status = 200, description = "Batch staged", body = BatchUploadResponse),
        (status = 400, description = "Invalid location or no files", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    ),
)]
#[instrument(skip(state, request_id, multipart), fields(request_id = request_id.0))]
pub async fn upload_photos(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(location): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchUploadResponse>, AppError> {
    let files = collect_files(multipart, &["photos[]", "photos"]).await?;
    ingest_batch(
        &state,
        &location,
        UploadCategory::Photos,
        files,
        "Photo upload complete",
    )
    .await
}

#[utoipa::path(
    post,
    path = "/api/upload/manufacturer/{location}",
    tag = "Uploads",
    operation_id = "uploadManufacturerSheet",
    summary = "Stage the manufacturer spreadsheet",
    description = "Stores the `file` part as `manufacturer_file_{location}{ext}`, replacing any \
        previous sheet. Only `.xlsx` and `.xls` are accepted.",
    params(("location" = String, Path, description = "Location identifier")),
    request_body(content_type = "multipart/form-data", description = "A single spreadsheet"),
    responses(
        (status = 200, description = "Sheet staged", body = SheetUploadResponse),
        (
            status = 400,
            description = "Invalid location, no file or unsupported type",
            body = ErrorBody
        ),
        (status = 500, description = "Storage failure", body = ErrorBody),
    ),
)]
#[instrument(skip(state, request_id, multipart), fields(request_id = request_id.0))]
pub async fn upload_manufacturer(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(location): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SheetUploadResponse>, AppError> {
    let files = collect_files(multipart, &["file"]).await?;
    ingest_sheet(
        &state,
        &location,
        UploadCategory::ManufacturerSheet,
        files,
        None,
    )
    .await
}

#[utoipa::path(
    post,
    path = "/api/upload/jha/{location}/pdfs",
    tag = "Uploads",
    operation_id = "uploadHazardPdfs",
    summary = "Stage job hazard analysis documents",
    description = "Stores every `pdfs[]` (or `pdfs`) part under the location. \
        Already staged names are skipped.",
    params(("location" = String, Path, description = "Location identifier")),
    request_body(content_type = "multipart/form-data", description = "One or more documents"),
    responses(
        (status = 200, description = "Batch staged", body = BatchUploadResponse),
        (status = 400, description = "Invalid location or no files", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    ),
)]
#[instrument(skip(state, request_id, multipart), fields(request_id = request_id.0))]
pub async fn upload_jha_pdfs(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(location): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchUploadResponse>, AppError> {
    let files = collect_files(multipart, &["pdfs[]", "pdfs"]).await?;
    ingest_batch(
        &state,
        &location,
        UploadCategory::HazardPdfs,
        files,
        "JHA PDFs uploaded successfully",
    )
    .await
}

#[utoipa::path(
    post,
    path = "/api/upload/jha/{location}/excel",
    tag = "Uploads",
    operation_id = "uploadHazardSheet",
    summary = "Stage the job hazard analysis workbook",
    description = "Stores the `file` part as `jha_excel_{location}{ext}`, replacing any \
        previous workbook. Accepts `.xlsx`, `.xls` and `.xlsb`.",
    params(("location" = String, Path, description = "Location identifier")),
    request_body(content_type = "multipart/form-data", description = "A single workbook"),
    responses(
        (status = 200, description = "Workbook staged", body = SheetUploadResponse),
        (
            status = 400,
            description = "Invalid location, no file or unsupported type",
            body = ErrorBody
        ),
        (status = 500, description = "Storage failure", body = ErrorBody),
    ),
)]
#[instrument(skip(state, request_id, multipart), fields(request_id = request_id.0))]
pub async fn upload_jha_excel(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(location): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SheetUploadResponse>, AppError> {
    let files = collect_files(multipart, &["file"]).await?;
    ingest_sheet(
        &state,
        &location,
        UploadCategory::HazardSheet,
        files,
        Some("JHA Excel uploaded successfully"),
    )
    .await
}
