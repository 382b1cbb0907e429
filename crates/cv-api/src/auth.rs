//! Bearer-token extractor for staff routes.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use cv_core::{AdminProfile, AppError};
use futures_util::future::LocalBoxFuture;

use crate::error::ApiError;
use crate::state::AppState;

/// A request carrying a valid admin token. The admin row is re-read on
/// every request, so deleted accounts lose access at once.
///
/// Take `Option<AdminSession>` for routes where staff merely see more.
#[derive(Debug, Clone)]
pub struct AdminSession(pub AdminProfile);

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

impl FromRequest for AdminSession {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::Internal("application state not configured".to_string()))?;
            let token = token.ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;
            let admin = state.admins.authenticate(&token).await?;
            Ok(AdminSession(admin))
        })
    }
}
