use chrono::{DateTime, Utc};

use crate::domain::{Category, Post, PostDetail};

use super::Viewer;

/// Whether anyone at all may see `post` at `now`.
///
/// A post without a category only depends on its own flag and date.
pub fn is_public(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published && post.pub_date <= now && category.is_none_or(|c| c.is_published)
}

/// Whether `viewer` may see `post` at `now`. Authors always see their own posts.
pub fn can_view(
    viewer: &Viewer,
    post: &Post,
    category: Option<&Category>,
    now: DateTime<Utc>,
) -> bool {
    viewer.is(post.author_id) || is_public(post, category, now)
}

pub fn can_view_detail(viewer: &Viewer, detail: &PostDetail, now: DateTime<Utc>) -> bool {
    can_view(viewer, &detail.post, detail.category.as_ref(), now)
}
