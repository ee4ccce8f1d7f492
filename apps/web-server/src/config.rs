//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use blog_infra::database::DatabaseConfig;

/// Largest accepted image upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    /// Apply pending migrations on startup.
    pub run_migrations: bool,
    pub media_root: PathBuf,
    /// URL prefix uploaded files are served under.
    pub media_url: String,
    /// Mark session and CSRF cookies `Secure`.
    pub cookie_secure: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = DatabaseConfig {
            url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://blogicum.sqlite3?mode=rwc".to_string()),
            max_connections: parse_var("DB_MAX_CONNECTIONS", 10),
            min_connections: parse_var("DB_MIN_CONNECTIONS", 1),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8080),
            database,
            run_migrations: flag("RUN_MIGRATIONS", true),
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("media")),
            media_url: normalize_prefix(
                &env::var("MEDIA_URL").unwrap_or_else(|_| "/media".to_string()),
            ),
            cookie_secure: flag("COOKIE_SECURE", false),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no" | "off"))
        .unwrap_or(default)
}

/// `media/` and `/media/` both become `/media`.
fn normalize_prefix(raw: &str) -> String {
    format!("/{}", raw.trim_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_prefix_is_normalized() {
        assert_eq!(normalize_prefix("media"), "/media");
        assert_eq!(normalize_prefix("/media/"), "/media");
        assert_eq!(normalize_prefix("/static/uploads"), "/static/uploads");
    }
}
