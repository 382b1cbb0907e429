//! Voter-facing endpoints. Both resolve the voter identity first and set
//! the `voter_id` cookie on every response, errors included.

use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use cv_core::{AppError, BallotChoice, CandidateId};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::error::ApiError;
use crate::identity::{ensure_identity, with_cookie, FINGERPRINT_HEADER};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub fingerprint: Option<String>,
}

/// `GET /api/check`. The fingerprint may come as a query parameter or as
/// an `X-Fingerprint` header; the parameter wins.
///
/// The query string is parsed here rather than through an extractor so a
/// malformed one still gets a JSON error and the voter cookie.
pub async fn check_vote(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let query = web::Query::<CheckQuery>::from_query(req.query_string());
    let from_header = req
        .headers()
        .get(FINGERPRINT_HEADER)
        .and_then(|v| v.to_str().ok());
    let fingerprint = query
        .as_ref()
        .ok()
        .and_then(|q| q.fingerprint.as_deref())
        .filter(|fp| !fp.trim().is_empty())
        .or(from_header);

    let (identity, cookie) = ensure_identity(&req, &state.identity, fingerprint);
    let resp = match &query {
        Err(e) => ApiError(AppError::ValidationError(format!("invalid query: {e}"))).error_response(),
        Ok(_) => match state.ballots.check_status(&identity).await {
            Ok(status) => HttpResponse::Ok().json(status),
            Err(e) => ApiError(e).error_response(),
        },
    };
    with_cookie(resp, cookie)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub king_id: Option<CandidateId>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub queen_id: Option<CandidateId>,
    pub fingerprint: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdField {
    Number(CandidateId),
    Text(String),
}

/// Form-backed clients send ids as strings; accept `7` and `"7"` alike.
/// A blank string counts as missing.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<CandidateId>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IdField>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdField::Number(id)) => Ok(Some(id)),
        Some(IdField::Text(raw)) if raw.trim().is_empty() => Ok(None),
        Some(IdField::Text(raw)) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid candidate id `{raw}`"))),
    }
}

/// `POST /api/vote`
pub async fn submit_vote(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<VoteRequest>,
) -> HttpResponse {
    let body = body.into_inner();
    let (identity, cookie) = ensure_identity(&req, &state.identity, body.fingerprint.as_deref());

    let outcome = match (body.king_id, body.queen_id) {
        (Some(king_id), Some(queen_id)) => {
            state
                .ballots
                .submit(&identity, BallotChoice { king_id, queen_id })
                .await
        }
        _ => Err(AppError::ValidationError(
            "Both kingId and queenId are required".to_string(),
        )),
    };

    let resp = match outcome {
        Ok(_) => HttpResponse::Created().json(json!({
            "success": true,
            "message": "Vote submitted successfully",
        })),
        Err(e) => ApiError(e).error_response(),
    };
    with_cookie(resp, cookie)
}
