//! Middleware for logging and cross-origin access.

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;

// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}

// The manage API is called from scripts on other origins with a bearer token.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(3600)
}
