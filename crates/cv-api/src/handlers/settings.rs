//! The voting and announcement switches.

use actix_web::{web, HttpResponse};
use cv_core::AppError;
use serde_json::{json, Value};

use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn voting_open(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let open = state.gate.voting_open().await?;
    Ok(HttpResponse::Ok().json(json!({ "open": open })))
}

pub async fn results_announced(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let announced = state.gate.results_announced().await?;
    Ok(HttpResponse::Ok().json(json!({ "announced": announced })))
}

/// `GET /api/settings` (admin)
pub async fn all(
    state: web::Data<AppState>,
    _admin: AdminSession,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.gate.flags().await?))
}

/// Strictly `true`/`false`; `"true"` or `1` are refused.
fn bool_field(body: &Value, field: &str) -> Result<bool, AppError> {
    body.get(field)
        .and_then(Value::as_bool)
        .ok_or_else(|| AppError::ValidationError(format!("{field} must be a boolean")))
}

/// `PUT /api/settings/voting-open` (admin)
pub async fn set_voting_open(
    state: web::Data<AppState>,
    admin: AdminSession,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let open = bool_field(&body, "open")?;
    state.gate.set_voting_open(open).await?;
    tracing::info!(admin_id = admin.0.id, open, "voting switch changed");

    let message = if open {
        "Voting is now open!"
    } else {
        "Voting has been closed."
    };
    Ok(HttpResponse::Ok().json(json!({ "success": true, "open": open, "message": message })))
}

/// `PUT /api/settings/results-announced` (admin)
pub async fn set_results_announced(
    state: web::Data<AppState>,
    admin: AdminSession,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let announced = bool_field(&body, "announced")?;
    state.gate.set_results_announced(announced).await?;
    tracing::info!(admin_id = admin.0.id, announced, "announcement switch changed");

    let message = if announced {
        "Results have been announced!"
    } else {
        "Results announcement has been hidden."
    };
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "announced": announced,
        "message": message,
    })))
}
