use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i32;

/// User entity - a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// First and last name joined, or the username when both are empty.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    pub fn as_author(&self) -> Author {
        Author {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// The public face of a user attached to posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    pub username: String,
}

/// Data needed to register an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}
