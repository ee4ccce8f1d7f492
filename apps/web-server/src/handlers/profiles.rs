//! Profile pages and profile editing.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;

use blog_core::domain::ProfileChanges;
use blog_core::policy::{ListingScope, Viewer};
use blog_core::ports::BaseRepository;
use blog_shared::{FormErrors, PageLinks, ProfileForm};

use super::guard::{HandlerConfig, redirect};
use super::{PageQuery, profile_path, render};
use crate::middleware::auth::{OptionalIdentity, session_cookie};
use crate::middleware::csrf::CsrfToken;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::templates::{Nav, PostCard, ProfileFormPage, ProfileHeader, ProfilePage};

const EDIT: HandlerConfig = HandlerConfig::authenticated("blog/user.html");

/// The viewer as the database knows them now.
///
/// Session tokens cache the username, and a rename leaves older sessions
/// holding the previous one, which someone else may since have taken.
async fn current_viewer(state: &AppState, viewer: Viewer) -> AppResult<Viewer> {
    let Some(user_id) = viewer.id() else {
        return Ok(viewer);
    };
    Ok(state
        .users
        .find_by_id(user_id)
        .await?
        .found()
        .map_or(Viewer::Anonymous, |user| Viewer::user(user.id, user.username)))
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let viewer = current_viewer(&state, identity.viewer()).await?;
    let now = Utc::now();

    let owner = state
        .users
        .find_by_username(&path)
        .await?
        .found_or(|| AppError::NotFound)?;
    let scope = ListingScope::for_profile(&viewer, &owner);

    let page = state
        .posts
        .list(&scope, query.request()?, now)
        .await?
        .found_or(|| AppError::NotFound)?;

    render(&ProfilePage {
        nav: Nav::new(&viewer, csrf.as_str()),
        profile: ProfileHeader::new(&owner, &viewer),
        posts: page
            .items
            .iter()
            .map(|summary| PostCard::from_summary(summary, &viewer, state.media.as_ref(), now))
            .collect(),
        pager: PageLinks::new(page.number, page.total_pages),
    })
}

/// GET /edit_profile/
pub async fn edit_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
) -> AppResult<HttpResponse> {
    let viewer = identity.viewer();
    if let Some(rejection) = EDIT.authenticate(&viewer).rejection(req.path()) {
        return rejection;
    }
    let Some(user_id) = viewer.id() else {
        return Err(AppError::NotFound);
    };

    // A valid token can outlive its user.
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .found_or(|| AppError::NotFound)?;

    render(&ProfileFormPage {
        nav: Nav::new(&viewer, csrf.as_str()),
        form: ProfileForm {
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            email: user.email,
            csrf_token: String::new(),
        },
        errors: FormErrors::new(),
    })
}

/// POST /edit_profile/
pub async fn edit_profile(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    form: web::Form<ProfileForm>,
) -> AppResult<HttpResponse> {
    let viewer = identity.viewer();
    if let Some(rejection) = EDIT.authenticate(&viewer).rejection(req.path()) {
        return rejection;
    }
    let Some(user_id) = viewer.id() else {
        return Err(AppError::NotFound);
    };
    csrf.verify(&form.csrf_token)?;

    let cleaned = match form.validate() {
        Ok(cleaned) => {
            if state
                .users
                .username_taken(&cleaned.username, Some(user_id))
                .await?
            {
                let mut errors = FormErrors::new();
                errors.add("username", "A user with that username already exists.");
                Err(errors)
            } else {
                Ok(cleaned)
            }
        }
        Err(errors) => Err(errors),
    };

    let cleaned = match cleaned {
        Ok(cleaned) => cleaned,
        Err(errors) => {
            return render(&ProfileFormPage {
                nav: Nav::new(&viewer, csrf.as_str()),
                form: form.into_inner(),
                errors,
            });
        }
    };

    let user = state
        .users
        .update_profile(
            user_id,
            ProfileChanges {
                first_name: cleaned.first_name,
                last_name: cleaned.last_name,
                username: cleaned.username,
                email: cleaned.email,
            },
        )
        .await?;
    tracing::info!(user_id, username = %user.username, "Profile updated");

    // The session token carries the username, so it is reissued.
    let token = state.tokens.generate_token(user.id, &user.username)?;
    let cookie = session_cookie(
        token,
        state.tokens.expiration_seconds(),
        state.cookie_secure,
    );

    let mut response = redirect(&profile_path(&req, &user.username)?);
    response
        .add_cookie(&cookie)
        .map_err(|e| AppError::Internal(format!("Cannot set session cookie: {e}")))?;
    Ok(response)
}
