//! # cv-api
//!
//! The HTTP layer for crownvote: routing, request parsing, identity
//! resolution and error mapping. Everything lives under `/api`; the binary
//! mounts static uploads next to it.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod state;

use actix_web::{web, ResponseError};
use cv_core::AppError;

pub use auth::AdminSession;
pub use error::ApiError;
pub use identity::IdentityPolicy;
pub use state::{ApiOptions, AppState};

use handlers::{admin, candidates, results, settings, upload, voting};

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        ApiError(AppError::ValidationError(format!("invalid JSON body: {err}"))).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|_err, _req| {
        ApiError(AppError::ValidationError("Invalid id".to_string())).into()
    })
}

/// Mounts every API route under `/api`. The caller provides
/// `web::Data<AppState>`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .app_data(path_config())
            .route("/health", web::get().to(handlers::health))
            // Voting
            .route("/check", web::get().to(voting::check_vote))
            .route("/vote", web::post().to(voting::submit_vote))
            // Candidates
            .service(
                web::resource("/candidates")
                    .route(web::get().to(candidates::list))
                    .route(web::post().to(candidates::create)),
            )
            .service(
                web::resource("/candidates/{id}")
                    .route(web::get().to(candidates::get))
                    .route(web::put().to(candidates::update))
                    .route(web::delete().to(candidates::delete)),
            )
            .route("/upload", web::post().to(upload::photo))
            // Results
            .route("/results", web::get().to(results::board))
            .route("/results/summary", web::get().to(results::summary))
            // Settings
            .route("/settings", web::get().to(settings::all))
            .service(
                web::resource("/settings/voting-open")
                    .route(web::get().to(settings::voting_open))
                    .route(web::put().to(settings::set_voting_open)),
            )
            .service(
                web::resource("/settings/results-announced")
                    .route(web::get().to(settings::results_announced))
                    .route(web::put().to(settings::set_results_announced)),
            )
            // Admin
            .route("/admin/login", web::post().to(admin::login))
            .route("/admin/register", web::post().to(admin::register))
            .route("/admin/me", web::get().to(admin::me))
            .route("/admin/password", web::put().to(admin::change_password))
            .route("/admin/results", web::get().to(results::admin_board))
            .default_service(web::to(not_found)),
    );
}

async fn not_found() -> actix_web::HttpResponse {
    ApiError(AppError::NotFound("Route".to_string(), String::new())).error_response()
}
