use std::io;

use dotenvy::dotenv;
use storefront::{build_server, create_pool, run_migrations, session_key, AppState, Config};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let pool = create_pool(&config.database_url).map_err(io::Error::other)?;
    run_migrations(&pool).map_err(io::Error::other)?;
    let key = session_key(&config).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    if config.auth_proxy_secret.is_none() {
        log::warn!("AUTH_PROXY_SECRET not set; login completion is disabled");
    }

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(AppState::diesel(pool, &config), key, &config)?.await
}
