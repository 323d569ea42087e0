pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::{Config, ConfigError};
pub use db::{create_pool, DbPool};
pub use handlers::AppState;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// The cookie signing key from config, or a throwaway one.
pub fn session_key(config: &Config) -> Result<Key, ConfigError> {
    match &config.session_key {
        Some(bytes) => Key::try_from(bytes.as_slice()).map_err(|e| ConfigError::Invalid {
            var: "SESSION_KEY",
            reason: e.to_string(),
        }),
        None => {
            log::warn!("SESSION_KEY not set; sessions will not survive a restart");
            Ok(Key::generate())
        }
    }
}

pub fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(secure)
        .build()
}

/// Build and return an actix-web `Server` bound to the configured address.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    key: Key,
    config: &Config,
) -> std::io::Result<actix_web::dev::Server> {
    let secure = config.session_cookie_secure;
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(session_middleware(key.clone(), secure))
            .wrap(Logger::default())
            .configure(handlers::routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", handlers::ApiDoc::openapi()),
            )
    })
    .bind((config.host.clone(), config.port))?
    .run())
}
