//! Candidate listing (public) and management (admin).

use std::str::FromStr;

use actix_web::{web, HttpResponse};
use cv_core::{AppError, CandidateId, CandidatePatch, Category, NewCandidate};
use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/candidates`. No vote counts.
pub async fn list(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.candidates.list_public().await?))
}

/// `GET /api/candidates/{id}`
pub async fn get(
    state: web::Data<AppState>,
    path: web::Path<CandidateId>,
) -> Result<HttpResponse, ApiError> {
    let candidate = state.candidates.get_public(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(candidate))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCandidateRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub photo_url: Option<String>,
}

/// `POST /api/candidates` (admin)
pub async fn create(
    state: web::Data<AppState>,
    _admin: AdminSession,
    body: web::Json<CreateCandidateRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let (Some(name), Some(category)) = (body.name, body.category) else {
        return Err(AppError::ValidationError("Name and category are required".to_string()).into());
    };

    let candidate = state
        .candidates
        .create(NewCandidate {
            name,
            category: Category::from_str(&category)?,
            photo_url: body.photo_url.filter(|p| !p.is_empty()),
        })
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Candidate created successfully",
        "candidate": candidate,
    })))
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCandidateRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub photo_url: Option<Option<String>>,
}

/// `PUT /api/candidates/{id}` (admin). Absent fields are left alone;
/// `"photoUrl": null` clears the photo reference.
pub async fn update(
    state: web::Data<AppState>,
    _admin: AdminSession,
    path: web::Path<CandidateId>,
    body: web::Json<UpdateCandidateRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let patch = CandidatePatch {
        name: body.name,
        category: body.category.as_deref().map(Category::from_str).transpose()?,
        photo_url: body.photo_url,
    };

    let candidate = state.candidates.update(path.into_inner(), patch).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Candidate updated successfully",
        "candidate": candidate,
    })))
}

/// `DELETE /api/candidates/{id}` (admin). 409 once ballots reference it.
pub async fn delete(
    state: web::Data<AppState>,
    _admin: AdminSession,
    path: web::Path<CandidateId>,
) -> Result<HttpResponse, ApiError> {
    state.candidates.delete(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Candidate deleted successfully",
    })))
}
