use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type CategoryId = i32;

/// Thematic category, managed directly in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}
