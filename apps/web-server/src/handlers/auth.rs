//! Registration, login and logout.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use blog_core::domain::NewUser;
use blog_core::error::RepoError;
use blog_shared::{ConfirmForm, FormErrors, LoginForm, RegistrationForm};

use super::guard::redirect;
use super::render;
use crate::middleware::auth::{OptionalIdentity, expired_session_cookie, session_cookie};
use crate::middleware::csrf::CsrfToken;
use crate::middleware::error::{AppError, AppResult, LOGIN_URL};
use crate::state::AppState;
use crate::templates::{LoginPage, Nav, RegistrationPage};

const BAD_CREDENTIALS: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// `?next=` on the login page.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: String,
}

/// Only same-site paths are followed after login.
fn safe_next(next: &str) -> Option<&str> {
    let local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    local.then_some(next)
}

fn login_action(next: &str) -> String {
    if next.is_empty() {
        LOGIN_URL.to_string()
    } else {
        AppError::login_url(next)
    }
}

/// GET /auth/registration/
pub async fn registration_form(
    identity: OptionalIdentity,
    csrf: CsrfToken,
) -> AppResult<HttpResponse> {
    render(&RegistrationPage {
        nav: Nav::new(&identity.viewer(), csrf.as_str()),
        username: String::new(),
        errors: FormErrors::new(),
    })
}

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    form: web::Form<RegistrationForm>,
) -> AppResult<HttpResponse> {
    csrf.verify(&form.csrf_token)?;

    let rejected = |errors: FormErrors| {
        render(&RegistrationPage {
            nav: Nav::new(&identity.viewer(), csrf.as_str()),
            username: form.username.clone(),
            errors,
        })
    };

    let (username, password) = match form.validate() {
        Ok(cleaned) => cleaned,
        Err(errors) => return rejected(errors),
    };

    if state.users.username_taken(&username, None).await? {
        let mut errors = FormErrors::new();
        errors.add("username", USERNAME_TAKEN);
        return rejected(errors);
    }

    let password_hash = state.passwords.hash(&password)?;
    let created = state
        .users
        .create(NewUser {
            username,
            email: String::new(),
            password_hash,
        })
        .await;

    match created {
        Ok(user) => {
            tracing::info!(user_id = user.id, username = %user.username, "User registered");
            Ok(redirect(LOGIN_URL))
        }
        // Lost a race with a concurrent registration.
        Err(RepoError::Constraint(_)) => {
            let mut errors = FormErrors::new();
            errors.add("username", USERNAME_TAKEN);
            rejected(errors)
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /auth/login/
pub async fn login_form(
    identity: OptionalIdentity,
    csrf: CsrfToken,
    query: web::Query<NextQuery>,
) -> AppResult<HttpResponse> {
    render(&LoginPage {
        nav: Nav::new(&identity.viewer(), csrf.as_str()),
        username: String::new(),
        action: login_action(&query.next),
        errors: FormErrors::new(),
    })
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    csrf: CsrfToken,
    query: web::Query<NextQuery>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    csrf.verify(&form.csrf_token)?;

    let rejected = |errors: FormErrors| {
        render(&LoginPage {
            nav: Nav::new(&identity.viewer(), csrf.as_str()),
            username: form.username.clone(),
            action: login_action(&query.next),
            errors,
        })
    };

    let (username, password) = match form.validate() {
        Ok(cleaned) => cleaned,
        Err(errors) => return rejected(errors),
    };

    let user = match state.users.find_by_username(&username).await?.found() {
        Some(user) if state.passwords.verify(&password, &user.password_hash)? => user,
        _ => {
            tracing::info!(username = %username, "Failed login attempt");
            let mut errors = FormErrors::new();
            errors.add_non_field(BAD_CREDENTIALS);
            return rejected(errors);
        }
    };

    let token = state.tokens.generate_token(user.id, &user.username)?;
    let cookie = session_cookie(
        token,
        state.tokens.expiration_seconds(),
        state.cookie_secure,
    );
    tracing::info!(user_id = user.id, "User logged in");

    let mut response = redirect(safe_next(&query.next).unwrap_or("/"));
    response
        .add_cookie(&cookie)
        .map_err(|e| AppError::Internal(format!("Cannot set session cookie: {e}")))?;
    Ok(response)
}

/// POST /auth/logout/
pub async fn logout(
    identity: OptionalIdentity,
    csrf: CsrfToken,
    form: web::Form<ConfirmForm>,
) -> AppResult<HttpResponse> {
    csrf.verify(&form.csrf_token)?;

    if let Some(user) = &identity.0 {
        tracing::info!(user_id = user.user_id, "User logged out");
    }

    let mut response = redirect("/");
    response
        .add_cookie(&expired_session_cookie())
        .map_err(|e| AppError::Internal(format!("Cannot clear session cookie: {e}")))?;
    Ok(response)
}
