//! Server entry point.
//!
//! # Responsibility
//! - Load configuration, start logging and open the database.
//! - Run the HTTP server until shutdown.

use actix_web::{middleware, web, App, HttpServer};
use daynote_core::db::open_db;
use daynote_core::{init_logging, AppConfig, SessionRepository, SqliteSessionRepository};
use daynote_web::api::not_found;
use daynote_web::AppState;
use log::{info, warn};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // A missing .env file is normal outside development.
    let _ = dotenv::dotenv();

    let config = AppConfig::from_env().map_err(|err| io::Error::other(err.to_string()))?;
    init_logging(config.log_level, &config.log_dir)
        .map_err(|err| io::Error::other(err.to_string()))?;

    let mut conn = open_db(&config.db_path).map_err(|err| io::Error::other(err.to_string()))?;
    match SqliteSessionRepository::try_new(&mut conn).and_then(|repo| repo.purge_expired()) {
        Ok(removed) => info!("event=session_purge module=web status=ok removed={removed}"),
        Err(err) => warn!("event=session_purge module=web status=error error={err}"),
    }

    info!(
        "event=server_start module=web status=ok bind={} delete_notice={}",
        config.bind,
        config.delete_notice.as_str()
    );
    let bind = config.bind.clone();
    let state = web::Data::new(AppState::new(conn, &config));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(daynote_web::config)
            .default_service(web::route().to(not_found))
            .wrap(middleware::Logger::default())
    })
    .bind(bind)?
    .run()
    .await
}
