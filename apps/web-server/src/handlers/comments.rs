//! Adding, editing and deleting comments.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;

use blog_core::domain::{Comment, CommentId, PostId};
use blog_core::lookup::Lookup;
use blog_core::ports::BaseRepository;
use blog_shared::{CommentForm, ConfirmForm, FormErrors};

use super::guard::{Admission, HandlerConfig, redirect};
use super::render;
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::csrf::CsrfToken;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::templates::{CommentPage, Nav};

/// Visibility is checked by `create_if_visible` in the same transaction as the
/// insert, not up front.
const ADD: HandlerConfig = HandlerConfig::authenticated("blog/comment.html").with_visibility();
const EDIT: HandlerConfig = HandlerConfig::owner_only("blog/comment.html");
const DELETE: HandlerConfig = HandlerConfig::owner_only("blog/comment.html");

/// The comment, as long as it belongs to the post named in the URL.
async fn find_comment(
    state: &AppState,
    post_id: PostId,
    comment_id: CommentId,
) -> AppResult<Lookup<Comment>> {
    Ok(state
        .comments
        .find_by_id(comment_id)
        .await?
        .filter(|c| c.post_id == post_id))
}

fn post_path(post_id: PostId) -> String {
    format!("/posts/{post_id}/")
}

/// POST /posts/{id}/comment/
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    path: web::Path<PostId>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let viewer = identity.viewer();
    if let Some(rejection) = ADD.authenticate(&viewer).rejection(&post_path(post_id)) {
        return rejection;
    }
    csrf.verify(&form.csrf_token)?;

    let text = match form.validate() {
        Ok(text) => text,
        Err(errors) => {
            return render(&CommentPage {
                nav: Nav::new(&viewer, csrf.as_str()),
                action: format!("/posts/{post_id}/comment/"),
                post_id,
                deleting: false,
                form: form.into_inner(),
                errors,
            });
        }
    };

    let comment = state
        .comments
        .create_if_visible(&viewer, post_id, text, Utc::now())
        .await?
        .found_or(|| AppError::NotFound)?;
    tracing::info!(post_id, comment_id = comment.id, "Comment added");

    Ok(redirect(&post_path(post_id)))
}

/// GET /posts/{id}/edit_comment/{comment_id}/
pub async fn edit_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    path: web::Path<(PostId, CommentId)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let viewer = identity.viewer();

    let comment = find_comment(&state, post_id, comment_id).await?;
    let comment = match EDIT.admit(&viewer, comment, |_| true, post_id, req.path())? {
        Admission::Granted(comment) => comment,
        Admission::Redirect(response) => return Ok(response),
    };

    render(&CommentPage {
        nav: Nav::new(&viewer, csrf.as_str()),
        action: req.path().to_string(),
        post_id,
        deleting: false,
        form: CommentForm {
            text: comment.text,
            csrf_token: String::new(),
        },
        errors: FormErrors::new(),
    })
}

/// POST /posts/{id}/edit_comment/{comment_id}/
pub async fn edit_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    path: web::Path<(PostId, CommentId)>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let viewer = identity.viewer();

    let comment = find_comment(&state, post_id, comment_id).await?;
    if let Admission::Redirect(response) =
        EDIT.admit(&viewer, comment, |_| true, post_id, req.path())?
    {
        return Ok(response);
    }
    csrf.verify(&form.csrf_token)?;

    match form.validate() {
        Ok(text) => {
            state.comments.update_text(comment_id, text).await?;
            tracing::info!(post_id, comment_id, "Comment edited");
            Ok(redirect(&post_path(post_id)))
        }
        Err(errors) => render(&CommentPage {
            nav: Nav::new(&viewer, csrf.as_str()),
            action: req.path().to_string(),
            post_id,
            deleting: false,
            form: form.into_inner(),
            errors,
        }),
    }
}

/// GET /posts/{id}/delete_comment/{comment_id}/
pub async fn delete_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    path: web::Path<(PostId, CommentId)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let viewer = identity.viewer();

    let comment = find_comment(&state, post_id, comment_id).await?;
    let comment = match DELETE.admit(&viewer, comment, |_| true, post_id, req.path())? {
        Admission::Granted(comment) => comment,
        Admission::Redirect(response) => return Ok(response),
    };

    render(&CommentPage {
        nav: Nav::new(&viewer, csrf.as_str()),
        action: req.path().to_string(),
        post_id,
        deleting: true,
        form: CommentForm {
            text: comment.text,
            csrf_token: String::new(),
        },
        errors: FormErrors::new(),
    })
}

/// POST /posts/{id}/delete_comment/{comment_id}/
pub async fn delete_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    path: web::Path<(PostId, CommentId)>,
    form: web::Form<ConfirmForm>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let viewer = identity.viewer();

    let comment = find_comment(&state, post_id, comment_id).await?;
    if let Admission::Redirect(response) =
        DELETE.admit(&viewer, comment, |_| true, post_id, req.path())?
    {
        return Ok(response);
    }
    csrf.verify(&form.csrf_token)?;

    state.comments.delete(comment_id).await?;
    tracing::info!(post_id, comment_id, "Comment deleted");

    Ok(redirect(&post_path(post_id)))
}
