use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type LocationId = i32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}
