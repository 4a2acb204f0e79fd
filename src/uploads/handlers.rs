use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    error::ApiError,
    state::AppState,
    uploads::services::{derive_file_name, object_key, Bucket},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload-file", post(upload_file))
        .route("/delete-file", post(delete_file))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default, rename = "fileName")]
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteFileResponse {
    pub success: bool,
}

struct IncomingFile {
    bytes: Bytes,
    original_name: String,
    content_type: String,
}

#[instrument(skip(state, multipart))]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|_| ApiError::validation("Invalid content type"))?;

    let mut file: Option<IncomingFile> = None;
    let mut bucket = Bucket::Images;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(_) => return Err(ApiError::validation("Invalid content type")),
        };
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::validation("Invalid content type"))?;
                file = Some(IncomingFile {
                    bytes,
                    original_name,
                    content_type,
                });
            }
            Some("bucket") => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| ApiError::validation("Invalid content type"))?;
                bucket = Bucket::parse(&value)
                    .ok_or_else(|| ApiError::validation("Invalid bucket"))?;
            }
            // other fields (fileName etc.) are deployment leftovers; the
            // key is always derived server-side
            _ => continue,
        }
    }

    let file = match file {
        Some(f) if !f.bytes.is_empty() => f,
        _ => return Err(ApiError::validation("No file provided")),
    };

    let file_name = derive_file_name(&mut rand::thread_rng(), &file.original_name);
    let key = object_key(bucket, &file_name);

    state
        .storage
        .put_object(&key, file.bytes, &file.content_type)
        .await
        .map_err(ApiError::Storage)?;

    let url = state.storage.public_url(&key);
    info!(%key, "file uploaded");
    Ok(Json(UploadResponse { url }))
}

/// Best-effort delete: a storage failure is logged, never surfaced. Only
/// a request naming no blob at all is an error.
#[instrument(skip(state, payload))]
pub async fn delete_file(
    State(state): State<AppState>,
    Json(payload): Json<DeleteFileRequest>,
) -> Result<Json<DeleteFileResponse>, ApiError> {
    let key: String = if let Some(url) = &payload.url {
        match state.storage.key_from_url(url) {
            Some(key) => key.to_string(),
            None => {
                warn!(%url, "delete-file for a URL outside our store, ignoring");
                return Ok(Json(DeleteFileResponse { success: true }));
            }
        }
    } else if let (Some(bucket), Some(file_name)) = (&payload.bucket, &payload.file_name) {
        let bucket =
            Bucket::parse(bucket).ok_or_else(|| ApiError::validation("Invalid bucket"))?;
        object_key(bucket, file_name)
    } else {
        return Err(ApiError::validation("URL is required"));
    };

    if let Err(e) = state.storage.delete_object(&key).await {
        warn!(error = %e, %key, "blob delete failed");
    }

    Ok(Json(DeleteFileResponse { success: true }))
}
