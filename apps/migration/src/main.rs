//! `migration up|down|status|fresh|...` against `DATABASE_URL`.

use sea_orm_migration::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .with_target(false)
        .init();

    tracing::info!("Running blog schema migrations");
    cli::run_cli(migration::Migrator).await;
}
