//! Post listings, the detail page and post create/edit/delete.

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;

use blog_core::domain::{PostDetail, PostDraft, PostSummary};
use blog_core::pagination::Page;
use blog_core::policy::{ListingScope, Viewer, can_view_detail};
use blog_core::ports::{BaseRepository, MediaError, MediaStore};
use blog_shared::{CommentForm, ConfirmForm, FormErrors, PageLinks, PostForm, PUB_DATE_FORMAT};

use super::guard::{Admission, HandlerConfig, redirect};
use super::{PageQuery, profile_path, render};
use crate::config::MAX_UPLOAD_BYTES;
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::csrf::CsrfToken;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::templates::{
    CategoryPage, Choice, CommentItem, DetailPage, IndexPage, Nav, PostCard, PostDeletePage,
    PostFormPage,
};

const DETAIL: HandlerConfig = HandlerConfig::public("blog/detail.html").with_visibility();
const CREATE: HandlerConfig = HandlerConfig::authenticated("blog/create.html");
const EDIT: HandlerConfig = HandlerConfig::owner_only("blog/create.html");
const DELETE: HandlerConfig = HandlerConfig::owner_only("blog/post_delete.html");

const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Cap on a single text field of the multipart post form.
const TEXT_FIELD_LIMIT: usize = 1024 * 1024;

fn cards(
    page: &Page<PostSummary>,
    viewer: &Viewer,
    media: &dyn MediaStore,
    now: DateTime<Utc>,
) -> Vec<PostCard> {
    page.items
        .iter()
        .map(|summary| PostCard::from_summary(summary, viewer, media, now))
        .collect()
}

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let viewer = identity.viewer();
    let now = Utc::now();

    let page = state
        .posts
        .list(&ListingScope::Public, query.request()?, now)
        .await?
        .found_or(|| AppError::NotFound)?;

    render(&IndexPage {
        nav: Nav::new(&viewer, csrf.as_str()),
        posts: cards(&page, &viewer, state.media.as_ref(), now),
        pager: PageLinks::new(page.number, page.total_pages),
    })
}

/// GET /category/{slug}/
pub async fn category_posts(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let viewer = identity.viewer();
    let now = Utc::now();

    let category = state
        .categories
        .find_by_slug(&path)
        .await?
        .found_or(|| AppError::NotFound)?;
    let scope = ListingScope::for_category(&category).found_or(|| AppError::NotFound)?;

    let page = state
        .posts
        .list(&scope, query.request()?, now)
        .await?
        .found_or(|| AppError::NotFound)?;

    render(&CategoryPage {
        nav: Nav::new(&viewer, csrf.as_str()),
        title: category.title,
        description: category.description,
        posts: cards(&page, &viewer, state.media.as_ref(), now),
        pager: PageLinks::new(page.number, page.total_pages),
    })
}

/// GET /posts/{id}/
pub async fn post_detail(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let viewer = identity.viewer();
    let now = Utc::now();

    let detail = state.posts.find_detail(id).await?;
    let detail = match DETAIL.admit(
        &viewer,
        detail,
        |d| can_view_detail(&viewer, d, now),
        id,
        req.path(),
    )? {
        Admission::Granted(detail) => detail,
        Admission::Redirect(response) => return Ok(response),
    };

    let comments: Vec<CommentItem> = state
        .comments
        .for_post(id)
        .await?
        .iter()
        .map(|view| CommentItem::new(view, &viewer))
        .collect();
    let post = PostCard::from_detail(
        &detail,
        comments.len() as u64,
        &viewer,
        state.media.as_ref(),
        now,
    );

    render(&DetailPage {
        nav: Nav::new(&viewer, csrf.as_str()),
        post,
        comments,
        can_comment: viewer.is_authenticated(),
        form: CommentForm::default(),
        errors: FormErrors::new(),
    })
}

/// GET /posts/create/
pub async fn create_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
) -> AppResult<HttpResponse> {
    let viewer = identity.viewer();
    if let Some(rejection) = CREATE.authenticate(&viewer).rejection(req.path()) {
        return rejection;
    }

    let page = form_page(
        &state,
        Nav::new(&viewer, csrf.as_str()),
        "Add a post",
        req.path().to_string(),
        PostForm::initial(Utc::now()),
        FormErrors::new(),
        None,
    )
    .await?;
    render(&page)
}

/// POST /posts/create/
pub async fn create_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let viewer = identity.viewer();
    if let Some(rejection) = CREATE.authenticate(&viewer).rejection(req.path()) {
        return rejection;
    }
    let (Some(author_id), Some(username)) = (viewer.id(), viewer.username()) else {
        return Err(AppError::Unauthenticated {
            next: req.path().to_string(),
        });
    };

    let mut submission = read_post_form(payload).await?;
    csrf.verify(&submission.form.csrf_token)?;

    match clean(&state, &mut submission).await? {
        Ok(draft) => {
            let post = state.posts.create(author_id, draft, Utc::now()).await?;
            tracing::info!(post_id = post.id, author_id, "Post published");
            Ok(redirect(&profile_path(&req, username)?))
        }
        Err(errors) => {
            let page = form_page(
                &state,
                Nav::new(&viewer, csrf.as_str()),
                "Add a post",
                req.path().to_string(),
                submission.form,
                errors,
                None,
            )
            .await?;
            render(&page)
        }
    }
}

/// GET /posts/{id}/edit/
pub async fn edit_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let viewer = identity.viewer();

    let detail = state.posts.find_detail(id).await?;
    let detail = match EDIT.admit(&viewer, detail, |_| true, id, req.path())? {
        Admission::Granted(detail) => detail,
        Admission::Redirect(response) => return Ok(response),
    };

    let page = form_page(
        &state,
        Nav::new(&viewer, csrf.as_str()),
        "Edit post",
        req.path().to_string(),
        prefilled(&detail),
        FormErrors::new(),
        current_image(&detail, state.media.as_ref()),
    )
    .await?;
    render(&page)
}

/// POST /posts/{id}/edit/
pub async fn edit_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    path: web::Path<i32>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let viewer = identity.viewer();

    let detail = state.posts.find_detail(id).await?;
    let detail = match EDIT.admit(&viewer, detail, |_| true, id, req.path())? {
        Admission::Granted(detail) => detail,
        Admission::Redirect(response) => return Ok(response),
    };

    let mut submission = read_post_form(payload).await?;
    csrf.verify(&submission.form.csrf_token)?;

    match clean(&state, &mut submission).await? {
        Ok(draft) => {
            state.posts.update(id, draft).await?;
            tracing::info!(post_id = id, "Post updated");
            Ok(redirect(&format!("/posts/{id}/")))
        }
        Err(errors) => {
            let page = form_page(
                &state,
                Nav::new(&viewer, csrf.as_str()),
                "Edit post",
                req.path().to_string(),
                submission.form,
                errors,
                current_image(&detail, state.media.as_ref()),
            )
            .await?;
            render(&page)
        }
    }
}

/// GET /posts/{id}/delete/
pub async fn delete_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let viewer = identity.viewer();
    let now = Utc::now();

    let detail = state.posts.find_detail(id).await?;
    let detail = match DELETE.admit(&viewer, detail, |_| true, id, req.path())? {
        Admission::Granted(detail) => detail,
        Admission::Redirect(response) => return Ok(response),
    };

    render(&PostDeletePage {
        nav: Nav::new(&viewer, csrf.as_str()),
        post: PostCard::from_detail(&detail, 0, &viewer, state.media.as_ref(), now),
    })
}

/// POST /posts/{id}/delete/
pub async fn delete_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    path: web::Path<i32>,
    form: web::Form<ConfirmForm>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let viewer = identity.viewer();

    let detail = state.posts.find_detail(id).await?;
    let detail = match DELETE.admit(&viewer, detail, |_| true, id, req.path())? {
        Admission::Granted(detail) => detail,
        Admission::Redirect(response) => return Ok(response),
    };
    csrf.verify(&form.csrf_token)?;

    state.posts.delete(id).await?;
    tracing::info!(post_id = id, "Post deleted with its comments");

    Ok(redirect(&profile_path(&req, &detail.author.username)?))
}

/// An uploaded file, held in memory until the rest of the form checks out.
struct Upload {
    file_name: String,
    data: Vec<u8>,
}

#[derive(Default)]
struct PostSubmission {
    form: PostForm,
    image: Option<Upload>,
    image_too_large: bool,
}

/// Collect the multipart post form. The image is buffered up to the upload limit.
async fn read_post_form(mut payload: Multipart) -> AppResult<PostSubmission> {
    let mut submission = PostSubmission::default();

    while let Some(mut field) = payload.try_next().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "image" {
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .unwrap_or_default()
                .to_string();
            let mut data = Vec::new();
            let mut too_large = false;
            while let Some(chunk) = field.try_next().await? {
                // Keep draining so the rest of the form can still be read.
                if too_large || data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                    too_large = true;
                    continue;
                }
                data.extend_from_slice(&chunk);
            }

            if too_large {
                submission.image_too_large = true;
            } else if !data.is_empty() {
                submission.image = Some(Upload { file_name, data });
            }
            continue;
        }

        let mut value = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if value.len() + chunk.len() > TEXT_FIELD_LIMIT {
                return Err(AppError::BadRequest(format!("Field {name} is too long")));
            }
            value.extend_from_slice(&chunk);
        }
        let value = String::from_utf8(value)
            .map_err(|_| AppError::BadRequest(format!("Field {name} is not valid UTF-8")))?;
        submission.form.set(&name, value);
    }

    Ok(submission)
}

/// Validate a submission against the form rules and the database, then store its image.
///
/// The image is only written once everything else is valid.
async fn clean(
    state: &AppState,
    submission: &mut PostSubmission,
) -> AppResult<Result<PostDraft, FormErrors>> {
    let fields = match submission.form.validate() {
        Ok(fields) => fields,
        Err(errors) => return Ok(Err(errors)),
    };

    let mut errors = FormErrors::new();
    if let Some(id) = fields.category_id {
        if !state.categories.find_by_id(id).await?.is_found() {
            errors.add("category", INVALID_CHOICE);
        }
    }
    if let Some(id) = fields.location_id {
        if !state.locations.find_by_id(id).await?.is_found() {
            errors.add("location", INVALID_CHOICE);
        }
    }
    if submission.image_too_large {
        errors.add(
            "image",
            format!(
                "The file is too large (limit {} MiB).",
                MAX_UPLOAD_BYTES / (1024 * 1024)
            ),
        );
    }
    if !errors.is_empty() {
        return Ok(Err(errors));
    }

    let image = match submission.image.take() {
        Some(upload) => {
            match state.media.save_image(upload.data, &upload.file_name).await {
                Ok(path) => Some(path),
                Err(MediaError::Io(msg)) => return Err(AppError::Internal(msg)),
                Err(rejected) => {
                    errors.add("image", rejected.to_string());
                    return Ok(Err(errors));
                }
            }
        }
        None => None,
    };

    Ok(Ok(PostDraft {
        title: fields.title,
        text: fields.text,
        pub_date: fields.pub_date,
        location_id: fields.location_id,
        category_id: fields.category_id,
        image,
    }))
}

fn prefilled(detail: &PostDetail) -> PostForm {
    let post = &detail.post;
    PostForm {
        title: post.title.clone(),
        text: post.text.clone(),
        pub_date: post.pub_date.format(PUB_DATE_FORMAT).to_string(),
        location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
        category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
        csrf_token: String::new(),
    }
}

fn current_image(detail: &PostDetail, media: &dyn MediaStore) -> Option<String> {
    detail.post.image.as_deref().map(|path| media.url(path))
}

async fn form_page(
    state: &AppState,
    nav: Nav,
    heading: &'static str,
    action: String,
    form: PostForm,
    errors: FormErrors,
    current_image: Option<String>,
) -> AppResult<PostFormPage> {
    let categories = state.categories.list_all().await?;
    let locations = state.locations.list_all().await?;

    Ok(PostFormPage {
        nav,
        heading,
        action,
        categories: Choice::categories(&categories, &form.category),
        locations: Choice::locations(&locations, &form.location),
        form,
        errors,
        current_image,
    })
}
