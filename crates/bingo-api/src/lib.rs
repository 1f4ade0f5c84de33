//! # bingo-api
//!
//! The web routing and orchestration layer for Streamer Bingo.

pub mod auth;
pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Configures every route.
///
/// # Developer Note
/// Page slugs occupy the first path segment, so the fixed `/auth` scope is
/// registered before the `/{page}` routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(auth::sign_up))
            .route("/signin", web::post().to(auth::sign_in))
            .route("/signout", web::post().to(auth::sign_out))
            .route("/me", web::get().to(auth::me))
            .route("/reset", web::post().to(auth::request_reset))
            .route("/reset/confirm", web::post().to(auth::confirm_reset))
            .route("/email", web::post().to(auth::update_email))
            .route("/password", web::post().to(auth::update_password)),
    )
    .service(
        web::scope("")
            // The viewer (e.g., /lydlbutton&seed=123&mode=abc)
            .route("/{page}", web::get().to(handlers::view_page))
            // The admin surface
            .route("/{page}/manage", web::get().to(handlers::manage_page))
            .route("/{page}/manage", web::post().to(handlers::apply_edits))
            .route("/{page}/manage/create", web::post().to(handlers::create_page)),
    );
}
