//! Post listings: visibility pushed into SQL, comment counts, pagination.
//!
//! Every function takes the connection (or transaction) it runs on.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, prelude::DateTimeWithTimeZone,
};

use blog_core::domain::{Author, Category, Location, Post, PostDetail, PostSummary};
use blog_core::lookup::Lookup;
use blog_core::pagination::{POSTS_PER_PAGE, Page, PageRequest, page_count};
use blog_core::policy::ListingScope;

use super::entity::{category, comment, location, post, user};

/// A post row annotated with the number of its comments.
#[derive(Debug, FromQueryResult)]
struct AnnotatedPost {
    id: i32,
    title: String,
    text: String,
    pub_date: DateTimeWithTimeZone,
    author_id: i32,
    location_id: Option<i32>,
    category_id: Option<i32>,
    image: Option<String>,
    is_published: bool,
    created_at: DateTimeWithTimeZone,
    comment_count: i64,
}

impl AnnotatedPost {
    fn split(self) -> (Post, u64) {
        let post = Post {
            id: self.id,
            title: self.title,
            text: self.text,
            pub_date: self.pub_date.into(),
            author_id: self.author_id,
            location_id: self.location_id,
            category_id: self.category_id,
            image: self.image,
            is_published: self.is_published,
            created_at: self.created_at.into(),
        };
        (post, self.comment_count.max(0) as u64)
    }
}

/// `WHERE` clause equivalent to [`ListingScope::admits`].
///
/// Expects `categories` to be LEFT JOINed onto `posts`.
pub fn scope_condition(scope: &ListingScope, now: DateTime<Utc>) -> Condition {
    let mut condition = match scope {
        ListingScope::Public => Condition::all(),
        ListingScope::Category(id) => Condition::all().add(post::Column::CategoryId.eq(*id)),
        ListingScope::Profile { author_id, .. } => {
            Condition::all().add(post::Column::AuthorId.eq(*author_id))
        }
    };

    if scope.filters_hidden() {
        let now: DateTimeWithTimeZone = now.into();
        condition = condition
            .add(post::Column::IsPublished.eq(true))
            .add(post::Column::PubDate.lte(now))
            .add(
                Condition::any()
                    .add(post::Column::CategoryId.is_null())
                    .add(category::Column::IsPublished.eq(true)),
            );
    }

    condition
}

/// Fetch one page of `scope`, newest first.
///
/// Returns `NotFound` when `page` lies beyond the last page.
pub async fn fetch_page<C>(
    conn: &C,
    scope: &ListingScope,
    page: PageRequest,
    now: DateTime<Utc>,
) -> Result<Lookup<Page<PostSummary>>, DbErr>
where
    C: ConnectionTrait,
{
    let query = post::Entity::find()
        .join(JoinType::LeftJoin, post::Relation::Category.def())
        .join(JoinType::LeftJoin, post::Relation::Comment.def())
        .filter(scope_condition(scope, now))
        .column_as(
            Expr::col((comment::Entity, comment::Column::Id)).count(),
            "comment_count",
        )
        .group_by(post::Column::Id)
        .order_by_desc(post::Column::PubDate)
        .order_by_desc(post::Column::Id)
        .into_model::<AnnotatedPost>();

    let paginator = query.paginate(conn, POSTS_PER_PAGE);
    let total_items = paginator.num_items().await?;
    let total_pages = page_count(total_items, POSTS_PER_PAGE);

    let Some(number) = page.resolve(total_pages) else {
        return Ok(Lookup::NotFound);
    };

    let rows = paginator.fetch_page(number - 1).await?;
    let items = summarize(conn, rows).await?;

    tracing::debug!(?scope, number, total_items, "Fetched post listing");

    Ok(Lookup::Found(Page {
        items,
        number,
        total_pages,
        total_items,
    }))
}

/// Resolve authors, categories and locations of a page in three queries.
async fn summarize<C>(conn: &C, rows: Vec<AnnotatedPost>) -> Result<Vec<PostSummary>, DbErr>
where
    C: ConnectionTrait,
{
    let rows: Vec<(Post, u64)> = rows.into_iter().map(AnnotatedPost::split).collect();

    let author_ids: BTreeSet<i32> = rows.iter().map(|(p, _)| p.author_id).collect();
    let category_ids: BTreeSet<i32> = rows.iter().filter_map(|(p, _)| p.category_id).collect();
    let location_ids: BTreeSet<i32> = rows.iter().filter_map(|(p, _)| p.location_id).collect();

    let authors = load_authors(conn, author_ids).await?;
    let categories = load_categories(conn, category_ids).await?;
    let locations = load_locations(conn, location_ids).await?;

    rows.into_iter()
        .map(|(post, comment_count)| {
            let author = authors
                .get(&post.author_id)
                .cloned()
                .ok_or_else(|| DbErr::RecordNotFound(format!("user {}", post.author_id)))?;
            let category = post.category_id.and_then(|id| categories.get(&id).cloned());
            let location = post.location_id.and_then(|id| locations.get(&id).cloned());
            Ok(PostSummary {
                post,
                author,
                category,
                location,
                comment_count,
            })
        })
        .collect()
}

async fn load_authors<C>(conn: &C, ids: BTreeSet<i32>) -> Result<HashMap<i32, Author>, DbErr>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(users.into_iter().map(|u| (u.id, Author::from(u))).collect())
}

async fn load_categories<C>(
    conn: &C,
    ids: BTreeSet<i32>,
) -> Result<HashMap<i32, Category>, DbErr>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let categories = category::Entity::find()
        .filter(category::Column::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(categories
        .into_iter()
        .map(|c| (c.id, Category::from(c)))
        .collect())
}

async fn load_locations<C>(
    conn: &C,
    ids: BTreeSet<i32>,
) -> Result<HashMap<i32, Location>, DbErr>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let locations = location::Entity::find()
        .filter(location::Column::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(locations
        .into_iter()
        .map(|l| (l.id, Location::from(l)))
        .collect())
}

/// Load a post with its author, category and location. No visibility check.
pub async fn find_detail<C>(conn: &C, id: i32) -> Result<Lookup<PostDetail>, DbErr>
where
    C: ConnectionTrait,
{
    let Some(model) = post::Entity::find_by_id(id).one(conn).await? else {
        return Ok(Lookup::NotFound);
    };
    let post = Post::from(model);

    let author = user::Entity::find_by_id(post.author_id)
        .one(conn)
        .await?
        .map(Author::from)
        .ok_or_else(|| DbErr::RecordNotFound(format!("user {}", post.author_id)))?;

    let category = match post.category_id {
        Some(category_id) => category::Entity::find_by_id(category_id)
            .one(conn)
            .await?
            .map(Category::from),
        None => None,
    };

    let location = match post.location_id {
        Some(location_id) => location::Entity::find_by_id(location_id)
            .one(conn)
            .await?
            .map(Location::from),
        None => None,
    };

    Ok(Lookup::Found(PostDetail {
        post,
        author,
        category,
        location,
    }))
}
