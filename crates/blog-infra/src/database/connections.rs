use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbConn, DbErr};

/// Configuration for the application database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    /// Single-connection config for an in-memory SQLite database.
    ///
    /// Every pooled connection would otherwise open its own empty database.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        }
    }
}

/// Open the connection pool described by `config`.
pub async fn connect(config: &DatabaseConfig) -> Result<DbConn, DbErr> {
    tracing::info!("Initializing database connection...");

    let mut opts = ConnectOptions::new(&config.url);
    opts.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(true);
    // Closing an idle in-memory connection would drop the whole database.
    if !config.url.contains(":memory:") {
        opts.idle_timeout(Duration::from_secs(300));
    }

    let conn = Database::connect(opts).await?;
    tracing::info!(
        backend = ?conn.get_database_backend(),
        pool = config.max_connections,
        "Database connected"
    );

    Ok(conn)
}
