//! Askama page templates and the display structs they render.
//!
//! Templates stay logic-free: everything they show is precomputed here.

use askama::Template;
use chrono::{DateTime, Utc};

use blog_core::domain::{Category, CommentView, Location, PostDetail, PostId, PostSummary, User};
use blog_core::policy::{Viewer, can_mutate, is_public};
use blog_core::ports::MediaStore;
use blog_shared::{CommentForm, FormErrors, PageLinks, PostForm, ProfileForm};

const DATE_FORMAT: &str = "%d %B %Y, %H:%M";
const EXCERPT_WORDS: usize = 30;

/// Header state shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub username: Option<String>,
    pub csrf_token: String,
}

impl Nav {
    pub fn new(viewer: &Viewer, csrf_token: &str) -> Self {
        Self {
            username: viewer.username().map(str::to_string),
            csrf_token: csrf_token.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryLink {
    pub title: String,
    pub slug: String,
    pub is_published: bool,
}

impl From<&Category> for CategoryLink {
    fn from(category: &Category) -> Self {
        Self {
            title: category.title.clone(),
            slug: category.slug.clone(),
            is_published: category.is_published,
        }
    }
}

/// A post as rendered in listings and on its detail page.
#[derive(Debug, Clone)]
pub struct PostCard {
    pub id: PostId,
    pub title: String,
    pub text: String,
    pub excerpt: String,
    pub pub_date: String,
    pub author: String,
    pub category: Option<CategoryLink>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub comment_count: u64,
    /// Not public; only its author gets to see it.
    pub hidden: bool,
    pub editable: bool,
}

impl PostCard {
    pub fn from_summary(
        summary: &PostSummary,
        viewer: &Viewer,
        media: &dyn MediaStore,
        now: DateTime<Utc>,
    ) -> Self {
        let post = &summary.post;
        Self {
            id: post.id,
            title: post.title.clone(),
            text: post.text.clone(),
            excerpt: excerpt(&post.text),
            pub_date: format_date(post.pub_date),
            author: summary.author.username.clone(),
            category: summary.category.as_ref().map(CategoryLink::from),
            location: published_location(summary.location.as_ref()),
            image_url: post.image.as_deref().map(|path| media.url(path)),
            comment_count: summary.comment_count,
            hidden: !is_public(post, summary.category.as_ref(), now),
            editable: can_mutate(viewer, post),
        }
    }

    pub fn from_detail(
        detail: &PostDetail,
        comment_count: u64,
        viewer: &Viewer,
        media: &dyn MediaStore,
        now: DateTime<Utc>,
    ) -> Self {
        let post = &detail.post;
        Self {
            id: post.id,
            title: post.title.clone(),
            text: post.text.clone(),
            excerpt: excerpt(&post.text),
            pub_date: format_date(post.pub_date),
            author: detail.author.username.clone(),
            category: detail.category.as_ref().map(CategoryLink::from),
            location: published_location(detail.location.as_ref()),
            image_url: post.image.as_deref().map(|path| media.url(path)),
            comment_count,
            hidden: !is_public(post, detail.category.as_ref(), now),
            editable: can_mutate(viewer, detail),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommentItem {
    pub id: i32,
    pub post_id: PostId,
    pub text: String,
    pub author: String,
    pub created_at: String,
    pub editable: bool,
}

impl CommentItem {
    pub fn new(view: &CommentView, viewer: &Viewer) -> Self {
        Self {
            id: view.comment.id,
            post_id: view.comment.post_id,
            text: view.comment.text.clone(),
            author: view.author.username.clone(),
            created_at: format_date(view.comment.created_at),
            editable: can_mutate(viewer, &view.comment),
        }
    }
}

/// An `<option>` of a select box.
#[derive(Debug, Clone)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl Choice {
    pub fn categories(categories: &[Category], selected: &str) -> Vec<Self> {
        categories
            .iter()
            .map(|c| Self::new(c.id, &c.title, selected))
            .collect()
    }

    pub fn locations(locations: &[Location], selected: &str) -> Vec<Self> {
        locations
            .iter()
            .map(|l| Self::new(l.id, &l.name, selected))
            .collect()
    }

    fn new(id: i32, label: &str, selected: &str) -> Self {
        let value = id.to_string();
        Self {
            selected: value == selected.trim(),
            value,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileHeader {
    pub username: String,
    pub full_name: String,
    pub joined: String,
    pub is_owner: bool,
}

impl ProfileHeader {
    pub fn new(user: &User, viewer: &Viewer) -> Self {
        Self {
            username: user.username.clone(),
            full_name: user.display_name(),
            joined: format_date(user.created_at),
            is_owner: viewer.username() == Some(user.username.as_str()),
        }
    }
}

pub fn format_date(date: DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn excerpt(text: &str) -> String {
    let mut words = text.split_whitespace();
    let head: Vec<&str> = words.by_ref().take(EXCERPT_WORDS).collect();
    let mut excerpt = head.join(" ");
    if words.next().is_some() {
        excerpt.push_str(" …");
    }
    excerpt
}

fn published_location(location: Option<&Location>) -> Option<String> {
    location
        .filter(|l| l.is_published)
        .map(|l| l.name.clone())
}

#[derive(Template)]
#[template(path = "blog/index.html")]
pub struct IndexPage {
    pub nav: Nav,
    pub posts: Vec<PostCard>,
    pub pager: PageLinks,
}

#[derive(Template)]
#[template(path = "blog/category.html")]
pub struct CategoryPage {
    pub nav: Nav,
    pub title: String,
    pub description: String,
    pub posts: Vec<PostCard>,
    pub pager: PageLinks,
}

#[derive(Template)]
#[template(path = "blog/profile.html")]
pub struct ProfilePage {
    pub nav: Nav,
    pub profile: ProfileHeader,
    pub posts: Vec<PostCard>,
    pub pager: PageLinks,
}

#[derive(Template)]
#[template(path = "blog/detail.html")]
pub struct DetailPage {
    pub nav: Nav,
    pub post: PostCard,
    pub comments: Vec<CommentItem>,
    pub can_comment: bool,
    pub form: CommentForm,
    pub errors: FormErrors,
}

/// Create and edit share one form.
#[derive(Template)]
#[template(path = "blog/create.html")]
pub struct PostFormPage {
    pub nav: Nav,
    pub heading: &'static str,
    pub action: String,
    pub form: PostForm,
    pub errors: FormErrors,
    pub categories: Vec<Choice>,
    pub locations: Vec<Choice>,
    pub current_image: Option<String>,
}

#[derive(Template)]
#[template(path = "blog/post_delete.html")]
pub struct PostDeletePage {
    pub nav: Nav,
    pub post: PostCard,
}

/// Comment edit form, or the delete confirmation when `deleting`.
#[derive(Template)]
#[template(path = "blog/comment.html")]
pub struct CommentPage {
    pub nav: Nav,
    pub action: String,
    pub post_id: PostId,
    pub deleting: bool,
    pub form: CommentForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "blog/user.html")]
pub struct ProfileFormPage {
    pub nav: Nav,
    pub form: ProfileForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "registration/login.html")]
pub struct LoginPage {
    pub nav: Nav,
    pub username: String,
    /// Form target, carrying `?next=` along.
    pub action: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "registration/registration_form.html")]
pub struct RegistrationPage {
    pub nav: Nav,
    pub username: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "pages/about.html")]
pub struct AboutPage {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "pages/rules.html")]
pub struct RulesPage {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "pages/404.html")]
pub struct NotFoundPage {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "pages/403csrf.html")]
pub struct CsrfFailurePage {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "pages/500.html")]
pub struct ServerErrorPage {
    pub nav: Nav,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_cuts_long_text() {
        let long = "word ".repeat(EXCERPT_WORDS + 5);

        let cut = excerpt(&long);

        assert_eq!(cut.split_whitespace().count(), EXCERPT_WORDS + 1);
        assert!(cut.ends_with('…'));
        assert_eq!(excerpt("short text"), "short text");
    }

    #[test]
    fn choice_marks_selected_value() {
        let location = Location {
            id: 7,
            name: "Moscow".to_string(),
            is_published: true,
            created_at: Utc::now(),
        };

        let choices = Choice::locations(&[location], "7");

        assert!(choices[0].selected);
        assert_eq!(choices[0].label, "Moscow");
    }
}
