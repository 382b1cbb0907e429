//! Request logging and CORS.

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;

/// Access log: remote-ip "request-line" status-code response-size time.
pub fn standard_middleware() -> Logger {
    Logger::new(r#"%a "%r" %s %b %Dms"#)
}

/// Credentials are allowed so the voter cookie survives a cross-origin
/// frontend; that in turn forbids a wildcard origin.
pub fn cors_policy(allowed_origins: &[String]) -> Cors {
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allowed_header("x-fingerprint")
        .supports_credentials()
        .max_age(3600)
}
