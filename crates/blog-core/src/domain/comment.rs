use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Author, Authored, PostId, UserId};

pub type CommentId = i32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub post_id: PostId,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Authored for Comment {
    fn author_id(&self) -> UserId {
        self.author_id
    }
}

/// Comment joined with its author for the detail page.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: Comment,
    pub author: Author,
}
