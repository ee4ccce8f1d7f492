//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod post;
mod user;

pub use category::{Category, CategoryId};
pub use comment::{Comment, CommentId, CommentView};
pub use location::{Location, LocationId};
pub use post::{Post, PostDetail, PostDraft, PostId, PostSummary};
pub use user::{Author, NewUser, ProfileChanges, User, UserId};

/// Entities that belong to a single user.
pub trait Authored {
    fn author_id(&self) -> UserId;
}
