use actix_web::{web, HttpResponse};
use cv_services::Audience;

use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::state::AppState;

fn audience(admin: &Option<AdminSession>) -> Audience {
    match admin {
        Some(_) => Audience::Admin,
        None => Audience::Public,
    }
}

/// `GET /api/results`. Hidden from the public until announced; a valid
/// admin token sees it regardless.
pub async fn board(
    state: web::Data<AppState>,
    admin: Option<AdminSession>,
) -> Result<HttpResponse, ApiError> {
    let board = state.results.board(audience(&admin)).await?;
    Ok(HttpResponse::Ok().json(board))
}

/// `GET /api/results/summary`
pub async fn summary(
    state: web::Data<AppState>,
    admin: Option<AdminSession>,
) -> Result<HttpResponse, ApiError> {
    let summary = state.results.summary(audience(&admin)).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// `GET /api/admin/results`
pub async fn admin_board(
    state: web::Data<AppState>,
    _admin: AdminSession,
) -> Result<HttpResponse, ApiError> {
    let board = state.results.board(Audience::Admin).await?;
    Ok(HttpResponse::Ok().json(board))
}
