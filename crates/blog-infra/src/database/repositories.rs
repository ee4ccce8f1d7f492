//! SeaORM repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use blog_core::domain::{
    Author, Category, Comment, CommentId, CommentView, Location, NewUser, Post, PostDetail,
    PostDraft, PostId, PostSummary, ProfileChanges, User, UserId,
};
use blog_core::error::RepoError;
use blog_core::lookup::Lookup;
use blog_core::pagination::{Page, PageRequest};
use blog_core::policy::{ListingScope, Viewer, can_view_detail};
use blog_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};

use super::base::{SeaBaseRepository, repo_err};
use super::entity::{category, comment, location, post, user};
use super::listing;

pub type SeaUserRepository = SeaBaseRepository<user::Entity>;
pub type SeaCategoryRepository = SeaBaseRepository<category::Entity>;
pub type SeaLocationRepository = SeaBaseRepository<location::Entity>;
pub type SeaPostRepository = SeaBaseRepository<post::Entity>;
pub type SeaCommentRepository = SeaBaseRepository<comment::Entity>;

#[async_trait]
impl UserRepository for SeaUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Lookup<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(User::from).into())
    }

    async fn username_taken(
        &self,
        username: &str,
        except: Option<UserId>,
    ) -> Result<bool, RepoError> {
        let mut query = user::Entity::find().filter(user::Column::Username.eq(username));
        if let Some(id) = except {
            query = query.filter(user::Column::Id.ne(id));
        }

        let count = query.count(&self.db).await.map_err(repo_err)?;
        Ok(count > 0)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let model = user::ActiveModel {
            id: NotSet,
            username: Set(new_user.username),
            email: Set(new_user.email),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            password_hash: Set(new_user.password_hash),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(repo_err)?;

        tracing::info!(user_id = model.id, "User registered");
        Ok(model.into())
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<User, RepoError> {
        let mut active = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repo_err)?
            .ok_or(RepoError::NotFound)?
            .into_active_model();

        active.first_name = Set(changes.first_name);
        active.last_name = Set(changes.last_name);
        active.username = Set(changes.username);
        active.email = Set(changes.email);

        let model = active.update(&self.db).await.map_err(repo_err)?;
        Ok(model.into())
    }
}

#[async_trait]
impl CategoryRepository for SeaCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Lookup<Category>, RepoError> {
        let result = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Category::from).into())
    }

    async fn list_all(&self) -> Result<Vec<Category>, RepoError> {
        let result = category::Entity::find()
            .order_by_asc(category::Column::Title)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl LocationRepository for SeaLocationRepository {
    async fn list_all(&self) -> Result<Vec<Location>, RepoError> {
        let result = location::Entity::find()
            .order_by_asc(location::Column::Name)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PostRepository for SeaPostRepository {
    async fn find_detail(&self, id: PostId) -> Result<Lookup<PostDetail>, RepoError> {
        listing::find_detail(&self.db, id).await.map_err(repo_err)
    }

    async fn create(
        &self,
        author_id: UserId,
        draft: PostDraft,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let model = post::ActiveModel {
            id: NotSet,
            title: Set(draft.title),
            text: Set(draft.text),
            pub_date: Set(draft.pub_date.into()),
            author_id: Set(author_id),
            location_id: Set(draft.location_id),
            category_id: Set(draft.category_id),
            image: Set(draft.image),
            is_published: Set(true),
            created_at: Set(now.into()),
        }
        .insert(&self.db)
        .await
        .map_err(repo_err)?;

        tracing::info!(post_id = model.id, author_id, "Post created");
        Ok(model.into())
    }

    async fn update(&self, id: PostId, draft: PostDraft) -> Result<Post, RepoError> {
        let mut post: Post = post::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repo_err)?
            .ok_or(RepoError::NotFound)?
            .into();

        post.apply(draft);

        let model = post::ActiveModel::from(post)
            .update(&self.db)
            .await
            .map_err(repo_err)?;

        tracing::info!(post_id = model.id, "Post updated");
        Ok(model.into())
    }

    async fn list(
        &self,
        scope: &ListingScope,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<Lookup<Page<PostSummary>>, RepoError> {
        listing::fetch_page(&self.db, scope, page, now)
            .await
            .map_err(repo_err)
    }
}

#[async_trait]
impl CommentRepository for SeaCommentRepository {
    async fn for_post(&self, post_id: PostId) -> Result<Vec<CommentView>, RepoError> {
        let rows = comment::Entity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .find_also_related(user::Entity)
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        rows.into_iter()
            .map(|(comment, author)| {
                let author = author.map(Author::from).ok_or(RepoError::NotFound)?;
                Ok(CommentView {
                    comment: comment.into(),
                    author,
                })
            })
            .collect()
    }

    async fn create_if_visible(
        &self,
        viewer: &Viewer,
        post_id: PostId,
        text: String,
        now: DateTime<Utc>,
    ) -> Result<Lookup<Comment>, RepoError> {
        let Some(author_id) = viewer.id() else {
            return Ok(Lookup::NotFound);
        };

        let txn = self.db.begin().await.map_err(repo_err)?;

        let visible = listing::find_detail(&txn, post_id)
            .await
            .map_err(repo_err)?
            .filter(|detail| can_view_detail(viewer, detail, now));

        if !visible.is_found() {
            tracing::debug!(post_id, "Comment rejected: post not visible");
            return Ok(Lookup::NotFound);
        }

        let model = comment::ActiveModel {
            id: NotSet,
            text: Set(text),
            post_id: Set(post_id),
            author_id: Set(author_id),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(repo_err)?;

        txn.commit().await.map_err(repo_err)?;

        tracing::info!(comment_id = model.id, post_id, "Comment added");
        Ok(Lookup::Found(model.into()))
    }

    async fn update_text(&self, id: CommentId, text: String) -> Result<Comment, RepoError> {
        let mut active = comment::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repo_err)?
            .ok_or(RepoError::NotFound)?
            .into_active_model();

        active.text = Set(text);

        let model = active.update(&self.db).await.map_err(repo_err)?;
        Ok(model.into())
    }
}
