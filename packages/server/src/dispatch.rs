//! Streams a result artifact to the client and deletes it afterwards.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{StatusCode, header};
use axum::response::Response;
use common::storage::StagingStore;
use futures::{StreamExt, future, stream};
use runner::JobOutcome;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

use crate::error::AppError;

/// Deletes the artifact once, either after the body finished streaming or,
/// when the body is dropped early, from a background task.
struct Cleanup {
    store: Arc<dyn StagingStore>,
    path: PathBuf,
    armed: bool,
}

impl Cleanup {
    async fn run(mut self) {
        self.armed = false;
        remove(&*self.store, &self.path).await;
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let store = self.store.clone();
        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(path = %path.display(), "Result delivery abandoned");
                handle.spawn(async move { remove(&*store, &path).await });
            }
            Err(_) => error!(path = %path.display(), "No runtime to remove result file"),
        }
    }
}

async fn remove(store: &dyn StagingStore, path: &std::path::Path) {
    match store.delete(path).await {
        Ok(true) => debug!(path = %path.display(), "Removed result file"),
        Ok(false) => {}
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to remove result file");
        }
    }
}

/// Stream a finished run's result under its download name.
pub async fn deliver_outcome(
    store: Arc<dyn StagingStore>,
    outcome: JobOutcome,
) -> Result<Response, AppError> {
    deliver(store, outcome.result_path, &outcome.download_name).await
}

/// Stream `path` as an attachment named `download_name`, deleting it when the
/// stream ends or is abandoned.
///
/// Failing to open the file is the only error reported to the client; once
/// headers are sent, read failures just abort the body.
pub async fn deliver(
    store: Arc<dyn StagingStore>,
    path: PathBuf,
    download_name: &str,
) -> Result<Response, AppError> {
    let cleanup = Cleanup {
        store: store.clone(),
        path: path.clone(),
        armed: true,
    };

    let reader = match store.open(&path).await {
        Ok(reader) => reader,
        Err(e) => {
            cleanup.run().await;
            return Err(AppError::DownloadFailed(e.to_string()));
        }
    };

    let body = ReaderStream::new(reader)
        .map(|chunk| {
            chunk.inspect_err(|e| error!(error = %e, "Result stream failed"))
        })
        .chain(
            stream::once(cleanup.run())
                .filter_map(|()| future::ready(None::<io::Result<Bytes>>)),
        );

    let content_type = mime_guess::from_path(download_name).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(download_name),
        )
        .body(Body::from_stream(body))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name.
fn content_disposition_value(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    if ascii == filename {
        return format!("attachment; filename=\"{filename}\"");
    }
    let ascii = if ascii.is_empty() { "download".into() } else { ascii };
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect();
    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}
