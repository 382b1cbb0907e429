//! # cv-api Handlers
//!
//! Thin adapters between HTTP and the cv-services layer. Business rules
//! live in the services; handlers parse input and pick the status code.

pub mod admin;
pub mod candidates;
pub mod results;
pub mod settings;
pub mod upload;
pub mod voting;

use actix_web::HttpResponse;
use chrono::Utc;
use serde_json::json;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok", "timestamp": Utc::now() }))
}
