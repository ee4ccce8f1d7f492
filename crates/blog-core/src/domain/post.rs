use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Author, Authored, Category, CategoryId, Location, LocationId, UserId};

pub type PostId = i32;

/// Post entity - a single publication.
///
/// `pub_date` may lie in the future, which schedules the publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: UserId,
    pub location_id: Option<LocationId>,
    pub category_id: Option<CategoryId>,
    /// Path relative to the media root.
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Overwrite the author-editable fields.
    ///
    /// An edit without a new upload keeps the current image.
    pub fn apply(&mut self, draft: PostDraft) {
        self.title = draft.title;
        self.text = draft.text;
        self.pub_date = draft.pub_date;
        self.location_id = draft.location_id;
        self.category_id = draft.category_id;
        if draft.image.is_some() {
            self.image = draft.image;
        }
    }
}

impl Authored for Post {
    fn author_id(&self) -> UserId {
        self.author_id
    }
}

/// The fields an author fills in when creating or editing a post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<LocationId>,
    pub category_id: Option<CategoryId>,
    pub image: Option<String>,
}

/// A post with its references resolved, as shown on the detail page.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub author: Author,
    pub category: Option<Category>,
    pub location: Option<Location>,
}

impl Authored for PostDetail {
    fn author_id(&self) -> UserId {
        self.post.author_id
    }
}

/// A listing row: the post, its resolved references and the comment count.
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub post: Post,
    pub author: Author,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: u64,
}
