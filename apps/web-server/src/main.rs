//! # Blogicum Web Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_files::Files;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use tracing_actix_web::TracingLogger;

use blog_infra::{JwtTokenService, connect};

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;
mod templates;

use config::AppConfig;
use middleware::csrf::CsrfMiddleware;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Blogicum web server on {}:{}",
        config.host,
        config.port
    );

    let db = connect(&config.database)
        .await
        .context("connecting to the database")?;

    if config.run_migrations {
        Migrator::up(&db, None)
            .await
            .context("applying migrations")?;
        tracing::info!("Migrations applied");
    }

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("creating media root {}", config.media_root.display()))?;

    let state = AppState::new(db, &config, Arc::new(JwtTokenService::from_env()));
    let media_url = config.media_url.clone();
    let media_root = config.media_root.clone();
    let cookie_secure = config.cookie_secure;

    HttpServer::new(move || {
        App::new()
            .wrap(CsrfMiddleware::new(cookie_secure))
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
            .service(Files::new(&media_url, &media_root))
            .default_service(web::to(handlers::pages::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}
