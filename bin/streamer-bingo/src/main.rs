//! # Streamer Bingo Binary
//!
//! The entry point that assembles the application based on compile-time features.

use actix_web::{web, App, HttpServer};
use bingo_api::handlers::AppState;
use bingo_api::middleware::{cors_policy, standard_middleware};
use bingo_core::PageRepo;
use secrecy::ExposeSecret;
use std::sync::Arc;

#[cfg(feature = "db-sqlite")]
use bingo_db_sqlite::SqliteDocumentStore;

#[cfg(feature = "auth-simple")]
use bingo_auth_simple::SimpleIdentityProvider;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = configs::load().map_err(std::io::Error::other)?;
    if settings.auth.session_salt.expose_secret() == configs::DEFAULT_SESSION_SALT {
        log::warn!("auth.session_salt is the default; set BINGO__AUTH__SESSION_SALT");
    }

    // 1. Initialize Document Store Implementation
    #[cfg(feature = "db-sqlite")]
    let store = SqliteDocumentStore::new(&settings.database.url)
        .await
        .map_err(std::io::Error::other)?;

    // 2. Initialize Identity Implementation
    #[cfg(feature = "auth-simple")]
    let auth = SimpleIdentityProvider::new(settings.auth.session_salt.expose_secret());

    // 3. Wrap in AppState (Using dynamic dispatch for maximum flexibility)
    let state = web::Data::new(AppState {
        pages: PageRepo::new(Arc::new(store)),
        auth: Box::new(auth),
        super_admins: settings.auth.super_admins.clone(),
        free_space_label: settings.board.free_space_label.clone(),
    });

    state.auth.on_auth_state_changed(Arc::new(|user: Option<&bingo_core::AuthUser>| match user {
        Some(user) => log::debug!("auth state: {} signed in", user.display_name),
        None => log::debug!("auth state: signed out"),
    }));

    let (host, port) = (settings.server.host.clone(), settings.server.port);
    log::info!("Streamer Bingo starting on http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(standard_middleware())
            .wrap(cors_policy())
            .configure(bingo_api::configure_routes)
    })
    .bind((host, port))?
    .run()
    .await
}
