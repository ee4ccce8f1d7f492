//! Database connection management and SeaORM repositories.

mod base;
mod connections;
pub mod entity;
pub mod listing;
mod repositories;

pub use base::SeaBaseRepository;
pub use connections::{DatabaseConfig, connect};
pub use repositories::{
    SeaCategoryRepository, SeaCommentRepository, SeaLocationRepository, SeaPostRepository,
    SeaUserRepository,
};
