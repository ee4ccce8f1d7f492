//! Session cookie handling and identity extraction.

use std::future::{Ready, ready};

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};

use blog_core::domain::UserId;
use blog_core::policy::Viewer;
use blog_core::ports::{AuthError, TokenClaims};

use crate::state::AppState;

/// Name of the cookie carrying the session JWT.
pub const SESSION_COOKIE: &str = "blogicum_session";

/// The signed-in user, as recorded in the session token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Identity extractor that never fails: anonymous requests yield `None`.
///
/// Whether a route needs a signed-in user is decided by its handler's guard.
#[derive(Debug, Clone)]
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn viewer(&self) -> Viewer {
        match &self.0 {
            Some(identity) => Viewer::user(identity.user_id, identity.username.clone()),
            None => Viewer::Anonymous,
        }
    }
}

/// Session token from the cookie, or from an `Authorization: Bearer` header.
fn session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn identify(req: &HttpRequest) -> Result<Identity, AuthError> {
    let token = session_token(req).ok_or(AuthError::MissingAuth)?;

    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        ));
    };

    state.tokens.validate_token(&token).map(Identity::from)
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match identify(req) {
            Ok(identity) => ready(Ok(OptionalIdentity(Some(identity)))),
            Err(AuthError::MissingAuth) => ready(Ok(OptionalIdentity(None))),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unusable session token");
                ready(Ok(OptionalIdentity(None)))
            }
        }
    }
}

/// Cookie that signs the holder in for `max_age_seconds`.
pub fn session_cookie(token: String, max_age_seconds: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(max_age_seconds))
        .finish()
}

/// Cookie that makes the browser drop the session.
pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}
