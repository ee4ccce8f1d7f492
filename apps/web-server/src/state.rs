//! Application state - shared across all handlers.

use std::sync::Arc;

use sea_orm::DbConn;

use blog_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, MediaStore, PasswordService,
    PostRepository, TokenService, UserRepository,
};
use blog_infra::{
    Argon2PasswordService, LocalMediaStore, SeaCategoryRepository, SeaCommentRepository,
    SeaLocationRepository, SeaPostRepository, SeaUserRepository,
};

use crate::config::{AppConfig, MAX_UPLOAD_BYTES};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub media: Arc<dyn MediaStore>,
    pub cookie_secure: bool,
}

impl AppState {
    /// Wire the SeaORM repositories over one connection pool.
    pub fn new(db: DbConn, config: &AppConfig, tokens: Arc<dyn TokenService>) -> Self {
        let media = LocalMediaStore::new(
            config.media_root.clone(),
            config.media_url.clone(),
            MAX_UPLOAD_BYTES,
        );

        tracing::info!("Application state initialized");

        Self {
            users: Arc::new(SeaUserRepository::new(db.clone())),
            categories: Arc::new(SeaCategoryRepository::new(db.clone())),
            locations: Arc::new(SeaLocationRepository::new(db.clone())),
            posts: Arc::new(SeaPostRepository::new(db.clone())),
            comments: Arc::new(SeaCommentRepository::new(db.clone())),
            db,
            tokens,
            passwords: Arc::new(Argon2PasswordService::new()),
            media: Arc::new(media),
            cookie_secure: config.cookie_secure,
        }
    }
}
