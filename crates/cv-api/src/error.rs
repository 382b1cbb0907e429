//! HTTP mapping for `AppError`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use cv_core::AppError;
use serde_json::json;

/// `AppError` as an actix response. Handlers return `Result<_, ApiError>`
/// and lean on `?` for the conversion.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        ApiError(e)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl ApiError {
    fn message(&self) -> String {
        match &self.0 {
            AppError::NotFound(kind, _) => format!("{kind} not found"),
            AppError::ValidationError(msg)
            | AppError::Unauthorized(msg)
            | AppError::Conflict(msg)
            | AppError::InvalidCandidate(msg) => msg.clone(),
            AppError::AlreadyVoted => "You have already voted".to_string(),
            AppError::VotingClosed => "Voting is closed".to_string(),
            AppError::ResultsHidden => "Results have not been announced yet".to_string(),
            AppError::Internal(_) => "Something went wrong, please try again".to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::ValidationError(_) | AppError::InvalidCandidate(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AlreadyVoted | AppError::VotingClosed | AppError::ResultsHidden => {
                StatusCode::FORBIDDEN
            }
            AppError::NotFound(_, _) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = self.message();
        let body = match &self.0 {
            AppError::AlreadyVoted => json!({ "error": error, "alreadyVoted": true }),
            AppError::VotingClosed => json!({ "error": error, "votingClosed": true }),
            AppError::ResultsHidden => json!({ "error": error, "announced": false }),
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "request failed");
                json!({ "error": error, "retryable": true })
            }
            _ => json!({ "error": error }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
