use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Category, CategoryId, Comment, CommentId, CommentView, Location, LocationId, NewUser, Post,
    PostDetail, PostDraft, PostId, PostSummary, ProfileChanges, User, UserId,
};
use crate::error::RepoError;
use crate::lookup::Lookup;
use crate::pagination::{Page, PageRequest};
use crate::policy::{ListingScope, Viewer};

/// Operations every table supports.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Lookup<T>, RepoError>;

    /// Hard-delete an entity by its ID. Foreign keys decide what happens to dependents.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UserRepository: BaseRepository<User, UserId> {
    async fn find_by_username(&self, username: &str) -> Result<Lookup<User>, RepoError>;

    /// True if another user (not `except`) already uses `username`.
    async fn username_taken(
        &self,
        username: &str,
        except: Option<UserId>,
    ) -> Result<bool, RepoError>;

    async fn create(&self, user: NewUser) -> Result<User, RepoError>;

    async fn update_profile(&self, id: UserId, changes: ProfileChanges)
    -> Result<User, RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, CategoryId> {
    async fn find_by_slug(&self, slug: &str) -> Result<Lookup<Category>, RepoError>;

    async fn list_all(&self) -> Result<Vec<Category>, RepoError>;
}

#[async_trait]
pub trait LocationRepository: BaseRepository<Location, LocationId> {
    async fn list_all(&self) -> Result<Vec<Location>, RepoError>;
}

#[async_trait]
pub trait PostRepository: BaseRepository<Post, PostId> {
    /// Post with author, category and location resolved. No visibility check.
    async fn find_detail(&self, id: PostId) -> Result<Lookup<PostDetail>, RepoError>;

    async fn create(
        &self,
        author_id: UserId,
        draft: PostDraft,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError>;

    async fn update(&self, id: PostId, draft: PostDraft) -> Result<Post, RepoError>;

    /// One page of the listing described by `scope`, newest first, with comment counts.
    ///
    /// `NotFound` when the requested page does not exist.
    async fn list(
        &self,
        scope: &ListingScope,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<Lookup<Page<PostSummary>>, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, CommentId> {
    /// Comments of a post, oldest first.
    async fn for_post(&self, post_id: PostId) -> Result<Vec<CommentView>, RepoError>;

    /// Add a comment if `viewer` can see the post at `now`.
    ///
    /// The check and the insert share one transaction.
    async fn create_if_visible(
        &self,
        viewer: &Viewer,
        post_id: PostId,
        text: String,
        now: DateTime<Utc>,
    ) -> Result<Lookup<Comment>, RepoError>;

    async fn update_text(&self, id: CommentId, text: String) -> Result<Comment, RepoError>;
}
