//! Application errors rendered as HTML error pages.

use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use askama::Template;

use blog_core::error::{DomainError, RepoError};
use blog_core::ports::{AuthError, MediaError};

use crate::templates::{CsrfFailurePage, Nav, NotFoundPage, ServerErrorPage};

pub const LOGIN_URL: &str = "/auth/login/";

/// Everything a handler can fail with.
///
/// Ownership mismatches are not errors: handlers redirect to the post instead.
#[derive(Debug)]
pub enum AppError {
    /// Absent, or present but invisible to the viewer.
    NotFound,
    /// Login required; `next` is where to return afterwards.
    Unauthenticated { next: String },
    Csrf,
    BadRequest(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound => write!(f, "Not found"),
            AppError::Unauthenticated { next } => write!(f, "Login required for {}", next),
            AppError::Csrf => write!(f, "CSRF verification failed"),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl AppError {
    pub fn login_url(next: &str) -> String {
        match serde_urlencoded::to_string(&[("next", next)]) {
            Ok(query) => format!("{LOGIN_URL}?{query}"),
            Err(_) => LOGIN_URL.to_string(),
        }
    }
}

fn render_page<T: Template>(status: StatusCode, page: &T) -> HttpResponse {
    match page.render() {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(e) => {
            tracing::error!(error = %e, "Error page failed to render");
            HttpResponse::build(status)
                .content_type("text/plain; charset=utf-8")
                .body(status.canonical_reason().unwrap_or("Error"))
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthenticated { .. } => StatusCode::SEE_OTHER,
            AppError::Csrf => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let nav = Nav::default();
        match self {
            AppError::NotFound => render_page(self.status_code(), &NotFoundPage { nav }),
            AppError::Unauthenticated { next } => HttpResponse::SeeOther()
                .insert_header((header::LOCATION, Self::login_url(next)))
                .finish(),
            AppError::Csrf => {
                tracing::warn!("Rejected request with a bad CSRF token");
                render_page(self.status_code(), &CsrfFailurePage { nav })
            }
            AppError::BadRequest(detail) => HttpResponse::BadRequest()
                .content_type("text/plain; charset=utf-8")
                .body(detail.clone()),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                render_page(self.status_code(), &ServerErrorPage { nav })
            }
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { .. } | DomainError::InvalidPage(_) => {
                tracing::debug!(error = %err, "Not found");
                AppError::NotFound
            }
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound,
            RepoError::Constraint(msg) => {
                tracing::warn!("Constraint violation: {}", msg);
                AppError::BadRequest("The submitted data conflicts with existing records".to_string())
            }
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Io(msg) => AppError::Internal(msg),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::Internal(format!("Template rendering failed: {}", err))
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_url_encodes_next() {
        assert_eq!(
            AppError::login_url("/posts/1/edit/?a=b"),
            "/auth/login/?next=%2Fposts%2F1%2Fedit%2F%3Fa%3Db"
        );
    }

    #[test]
    fn unauthenticated_redirects_to_login() {
        let response = AppError::Unauthenticated {
            next: "/posts/create/".to_string(),
        }
        .error_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=%2Fposts%2Fcreate%2F"
        );
    }

    #[test]
    fn missing_and_csrf_render_distinct_pages() {
        assert_eq!(
            AppError::NotFound.error_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::Csrf.error_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Internal("boom".to_string())
                .error_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
