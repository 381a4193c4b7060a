use common::{IngestReport, Location};
use serde::Serialize;

/// Response for multi-file uploads (photos, hazard PDFs).
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BatchUploadResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Photo upload complete")]
    pub message: String,
    /// Names written by this request.
    #[schema(example = json!(["IMG_0001.jpg"]))]
    pub uploaded: Vec<String>,
    /// Names that already existed and were left untouched.
    #[schema(example = json!(["IMG_0002.jpg"]))]
    pub skipped: Vec<String>,
    #[schema(value_type = String, example = "42")]
    pub location: Location,
}

impl BatchUploadResponse {
    pub fn new(report: IngestReport, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            uploaded: report.uploaded,
            skipped: report.skipped,
            location: report.location,
        }
    }
}

/// Response for single-sheet uploads.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SheetUploadResponse {
    #[schema(example = true)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "JHA Excel uploaded successfully")]
    pub message: Option<String>,
    /// Normalized stored name.
    #[schema(example = "manufacturer_file_42.xlsx")]
    pub filename: String,
    #[schema(value_type = String, example = "42")]
    pub location: Location,
}

impl SheetUploadResponse {
    pub fn new(report: IngestReport, message: Option<&str>) -> Self {
        Self {
            success: true,
            message: message.map(str::to_string),
            filename: report.filename.unwrap_or_default(),
            location: report.location,
        }
    }
}
