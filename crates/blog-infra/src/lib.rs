//! # Blogicum Infrastructure
//!
//! Concrete implementations of the ports defined in `blog-core`:
//! SeaORM repositories, JWT sessions, Argon2 passwords and local media storage.

pub mod auth;
pub mod database;
pub mod media;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::{
    DatabaseConfig, SeaCategoryRepository, SeaCommentRepository, SeaLocationRepository,
    SeaPostRepository, SeaUserRepository, connect,
};
pub use media::LocalMediaStore;
