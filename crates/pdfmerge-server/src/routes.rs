//! HTTP routes.
//!
//! - `POST /upload` accepts a multipart form with two or more PDF files in
//!   fields named `files` or `files[]` and an optional `output_filename`
//!   text field. It responds with a download link.
//! - `GET /download/{id}` returns the merged PDF as an attachment.
//! - `GET /health` reports liveness and the number of pending downloads.
//!
//! Errors are returned as `{ "error": ..., "code": ... }` where `code` is the
//! stable tag from [`PdfMergeError::code`].

use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use pdfmerge::store::ArtifactStore;
use pdfmerge::validation::Upload;
use pdfmerge::{InMemoryStore, MergeService, PdfMergeError, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    service: Arc<MergeService<InMemoryStore>>,
}

impl AppState {
    pub fn new(service: Arc<MergeService<InMemoryStore>>) -> Self {
        Self { service }
    }
}

/// Build the application router.
///
/// `max_upload_bytes` bounds the whole request body of an upload. With
/// `cors` set, cross-origin requests are allowed from anywhere.
pub fn router(state: AppState, max_upload_bytes: usize, cors: bool) -> Router {
    let router = Router::new()
        .route("/upload", post(upload))
        .route("/download/{id}", get(download))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub download_link: String,
    pub filename: String,
    pub expires_at: DateTime<Utc>,
    pub files: usize,
    pub pages: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|rejection| ApiError::BadRequest {
        status: rejection.status(),
        message: rejection.body_text(),
    })?;

    let mut uploads = Vec::new();
    let mut desired_name = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("files" | "files[]") => {
                let name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;

                // Browsers submit an empty, unnamed part when no file is chosen
                if bytes.is_empty() && name.as_deref().is_none_or(str::is_empty) {
                    continue;
                }
                uploads.push(Upload::new(name, bytes.to_vec()));
            }
            Some("output_filename") => {
                let text = field.text().await?;
                desired_name = Some(text).filter(|t| !t.trim().is_empty());
            }
            other => {
                debug!(field = ?other, "Ignoring unknown form field");
            }
        }
    }

    let service = Arc::clone(&state.service);
    let receipt = tokio::task::spawn_blocking(move || {
        service.process(&uploads, desired_name.as_deref())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Merge task failed: {e}")))??;

    Ok(Json(UploadResponse {
        message: "Files merged successfully".to_string(),
        download_link: format!("/download/{}", receipt.id),
        filename: receipt.filename,
        expires_at: receipt.expires_at,
        files: receipt.statistics.files_merged,
        pages: receipt.statistics.total_pages,
    }))
}

async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let download = state.service.retrieve(&id)?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        download.filename
    ))
    .map_err(|e| ApiError::Internal(format!("Invalid download filename: {e}")))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(Bytes::from_owner(download.bytes)),
    )
        .into_response())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": pdfmerge::NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "artifacts": state.service.store().len(),
    }))
}

/// Error returned by a handler.
#[derive(Debug)]
pub enum ApiError {
    /// The upload or merge was rejected.
    Service(PdfMergeError),

    /// The download could not be served.
    Download(StoreError),

    /// The request body could not be read as a multipart form.
    BadRequest { status: StatusCode, message: String },

    /// Something failed on our side.
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Service(PdfMergeError::Store(err)) | Self::Download(err) => store_status(err),
            Self::Service(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Service(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest { status, .. } => *status,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Service(err) => err.code(),
            Self::Download(err) => err.code(),
            Self::BadRequest { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                "PAYLOAD_TOO_LARGE"
            }
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound { .. } | StoreError::Expired { .. } => StatusCode::NOT_FOUND,
        StoreError::InvalidTtl => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PdfMergeError> for ApiError {
    fn from(err: PdfMergeError) -> Self {
        Self::Service(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Download(err)
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::BadRequest {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Service(err) => err.to_string(),
            Self::Download(err) => err.to_string(),
            Self::BadRequest { message, .. } => message.clone(),
            Self::Internal(message) => message.clone(),
        };

        if status.is_server_error() {
            error!(code = self.code(), error = %message, "Request failed");
        }

        let body = ErrorResponse {
            error: message,
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
