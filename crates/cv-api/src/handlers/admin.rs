//! Staff login and account management.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `POST /api/admin/login`
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let outcome = state.admins.login(&body.email, &body.password).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "token": outcome.token,
        "admin": outcome.admin,
    })))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub name: Option<String>,
}

/// `POST /api/admin/register`. Only an existing admin can add another.
pub async fn register(
    state: web::Data<AppState>,
    admin: AdminSession,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let created = state
        .admins
        .register(&body.email, &body.password, body.name)
        .await?;
    tracing::info!(by = admin.0.id, admin_id = created.id, "admin account added");
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Admin created successfully",
        "admin": created,
    })))
}

/// `GET /api/admin/me`
pub async fn me(admin: AdminSession) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "admin": admin.0 }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// `PUT /api/admin/password`
pub async fn change_password(
    state: web::Data<AppState>,
    admin: AdminSession,
    body: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    state
        .admins
        .change_password(admin.0.id, &body.current_password, &body.new_password)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password updated successfully",
    })))
}
