//! Error types shared by the domain and its storage ports.

use thiserror::Error;

/// Failures of the domain rules themselves.
///
/// Both variants surface as a 404: an absent entity and an invisible one look
/// the same to the viewer.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity_type} not found")]
    NotFound { entity_type: &'static str },

    /// `?page=` that is neither a positive number nor `last`.
    #[error("invalid page number: {0:?}")]
    InvalidPage(String),
}

/// Storage failures, as reported by repository implementations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database unavailable: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    /// The row to update or delete does not exist.
    #[error("row not found")]
    NotFound,

    /// Unique or foreign-key violation.
    #[error("constraint violated: {0}")]
    Constraint(String),
}
