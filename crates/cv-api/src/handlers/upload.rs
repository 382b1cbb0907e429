//! Candidate photo upload.

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{web, HttpResponse};
use cv_core::{AppError, CandidateId};
use futures_util::StreamExt;
use serde_json::json;

use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::state::AppState;

const MAX_ID_FIELD_BYTES: usize = 32;

#[derive(Debug, Default)]
struct UploadForm {
    photo: Option<Vec<u8>>,
    content_type: Option<String>,
    candidate_id: Option<CandidateId>,
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::ValidationError(format!("malformed upload: {e}"))
}

fn too_large(limit: usize) -> AppError {
    AppError::ValidationError(format!(
        "File size exceeds {}MB limit",
        limit / (1024 * 1024)
    ))
}

/// Buffers one field, failing as soon as it grows past `limit`.
async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(bad_multipart)?;
        if data.len() + chunk.len() > limit {
            return Err(too_large(limit));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn read_form(mut payload: Multipart, limit: usize) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(bad_multipart)?;
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "photo" => {
                form.content_type = field.content_type().map(|m| m.essence_str().to_string());
                form.photo = Some(read_field(&mut field, limit).await?);
            }
            "candidateId" => {
                let raw = read_field(&mut field, MAX_ID_FIELD_BYTES)
                    .await
                    .map_err(|_| AppError::ValidationError("candidateId is too long".to_string()))?;
                let text = String::from_utf8_lossy(&raw);
                let text = text.trim();
                if !text.is_empty() {
                    form.candidate_id = Some(text.parse().map_err(|_| {
                        AppError::ValidationError("candidateId must be an integer".to_string())
                    })?);
                }
            }
            _ => {
                // Drain unknown fields so the stream can advance.
                while let Some(chunk) = field.next().await {
                    chunk.map_err(bad_multipart)?;
                }
            }
        }
    }

    Ok(form)
}

/// `POST /api/upload` (admin). Multipart `photo`, optional `candidateId`.
pub async fn photo(
    state: web::Data<AppState>,
    _admin: AdminSession,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let form = read_form(payload, state.max_upload_bytes).await?;
    let photo = form
        .photo
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::ValidationError("No file uploaded".to_string()))?;

    let upload = state
        .candidates
        .attach_photo(
            photo,
            form.content_type.as_deref().unwrap_or_default(),
            form.candidate_id,
        )
        .await?;

    let message = match upload.candidate_id {
        Some(_) => "Photo uploaded and candidate updated",
        None => "Photo uploaded successfully",
    };
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": message,
        "photoUrl": upload.photo_url,
        "candidateId": upload.candidate_id,
    })))
}
