//! Profile image upload endpoints.
//!
//! Accepts multipart/form-data with a single file field named "image",
//! stores it under the configured uploads directory, and points the
//! caller's profile_image at the served URL.

use std::path::{Path as FsPath, PathBuf};

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Extension, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::{
    config::config,
    db::{self, UpdateUser},
    error::{Error, Result},
    middleware::{require_auth, AuthUser},
    AppState,
};

const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: usize,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/files/:filename", get(serve_file));

    let protected = Router::new()
        .route("/profile-image", post(upload_profile_image))
        .layer(axum::middleware::from_fn_with_state(state, require_auth))
        // Leave headroom for multipart framing on top of the file itself.
        .layer(DefaultBodyLimit::max(
            config().storage.max_upload_size + 64 * 1024,
        ));

    public.merge(protected)
}

fn sanitize_extension(filename: &str) -> Option<String> {
    FsPath::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Upload the caller's profile image.
async fn upload_profile_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let config = config();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name != "image" {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unnamed".into());

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".into());

        if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(Error::InvalidFileType(content_type));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidInput(format!("Failed to read file: {}", e)))?;

        if data.len() > config.storage.max_upload_size {
            return Err(Error::FileTooLarge {
                max_size: config.storage.max_upload_size,
            });
        }
        if data.is_empty() {
            return Err(Error::Validation("Uploaded file is empty".to_string()));
        }

        let extension = sanitize_extension(&filename).unwrap_or_else(|| "bin".to_string());
        let stored_name = format!("{}-{}.{}", auth.user_id, uuid::Uuid::new_v4(), extension);

        let dir = PathBuf::from(&config.storage.uploads_path);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Internal(format!("Failed to create uploads dir: {}", e)))?;
        tokio::fs::write(dir.join(&stored_name), &data)
            .await
            .map_err(|e| Error::Internal(format!("Failed to write file: {}", e)))?;

        let url = format!("/api/upload/files/{}", stored_name);

        db::update_user(
            &state.db,
            &auth.user_id,
            UpdateUser {
                profile_image: Some(url.clone()),
                ..Default::default()
            },
        )
        .await?;

        return Ok(Json(UploadResponse {
            url,
            filename: stored_name,
            size: data.len(),
        }));
    }

    Err(Error::Validation(
        "Multipart field 'image' is required".to_string(),
    ))
}

/// Serve an uploaded file. Filenames are generated server-side, so anything
/// with a path separator is rejected outright.
async fn serve_file(Path(filename): Path<String>) -> Result<Response> {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(Error::NotFound(format!("File not found: {}", filename)));
    }

    let path = PathBuf::from(&config().storage.uploads_path).join(&filename);
    let data = tokio::fs::read(&path)
        .await
        .map_err(|_| Error::NotFound(format!("File not found: {}", filename)))?;

    let mime = mime_guess::from_path(&path).first_or_octet_stream();

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime.to_string())],
        Body::from(data),
    )
        .into_response())
}
