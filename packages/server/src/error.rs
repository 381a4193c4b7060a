use axum::{
    Json,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use common::IngestError;
use runner::RunError;
use serde::Serialize;
use serde_json::Value;

use crate::extractors::request_id::RequestId;

/// Error response returned by every endpoint on failure.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Human-readable error description.
    #[schema(example = "No valid photos found for location 42")]
    pub error: String,
    /// Correlates the response with server log lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 1718000000123_u64)]
    pub request_id: Option<u64>,
    /// Diagnostic payload, e.g. the analyzer's stderr or a directory listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// Caller-side problem: bad location, missing or unsupported uploads.
    Validation {
        message: String,
        details: Option<Value>,
    },
    /// The analyzer failed, timed out or produced nothing.
    Processing {
        message: String,
        details: Option<Value>,
    },
    /// The result exists but could not be opened for streaming.
    DownloadFailed(String),
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: None,
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, error, details) = match self {
            AppError::Validation { message, details } => {
                (StatusCode::BAD_REQUEST, message, details)
            }
            AppError::Processing { message, details } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, details)
            }
            AppError::DownloadFailed(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Download failed".to_string(),
                Some(Value::String(detail)),
            ),
            AppError::Internal(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(Value::String(detail)),
            ),
        };
        (
            status,
            ErrorBody {
                error,
                request_id: None,
                details,
            },
        )
    }
}

impl IntoResponse for AppError {
    /// The body is completed with the request id by the request-id middleware,
    /// which finds the pending [`ErrorBody`] in the response extensions.
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Log a failed request and rebuild its body with the request id.
pub(crate) fn render_error(
    mut response: Response,
    request_id: RequestId,
    method: &Method,
    uri: &Uri,
) -> Response {
    let Some(mut body) = response.extensions_mut().remove::<ErrorBody>() else {
        return response;
    };
    let status = response.status();
    let details = body
        .details
        .as_ref()
        .map(Value::to_string)
        .unwrap_or_default();

    if status.is_server_error() {
        tracing::error!(
            request_id = request_id.0,
            %method,
            %uri,
            status = status.as_u16(),
            error = %body.error,
            details = %details,
            "Request failed"
        );
    } else {
        tracing::warn!(
            request_id = request_id.0,
            %method,
            %uri,
            status = status.as_u16(),
            error = %body.error,
            details = %details,
            "Request rejected"
        );
    }

    body.request_id = Some(request_id.0);
    (status, Json(body)).into_response()
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        if err.is_invalid_input() {
            AppError::validation(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

impl From<RunError> for AppError {
    fn from(err: RunError) -> Self {
        let details = err.details();
        match err {
            RunError::Location(e) => AppError::validation(e.to_string()),
            RunError::InvalidInput { message, details } => {
                AppError::Validation { message, details }
            }
            RunError::ProcessFailed { .. } => AppError::Processing {
                message: "Processing failed".into(),
                details,
            },
            RunError::TimedOut { .. }
            | RunError::OutputTooLarge { .. }
            | RunError::OutputMissing { .. }
            | RunError::Spawn { .. } => AppError::Processing {
                message: err.to_string(),
                details,
            },
            RunError::Io(_) | RunError::Storage(_) => AppError::Internal(err.to_string()),
        }
    }
}
