//! Double-submit CSRF protection.
//!
//! Every visitor gets a random `csrftoken` cookie; forms echo it back in a
//! `csrf_token` field and mutating handlers compare the two.

use std::future::{Future, Ready, ready};
use std::pin::Pin;

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use uuid::Uuid;

use crate::middleware::error::AppError;

pub const CSRF_COOKIE: &str = "csrftoken";

/// Middleware that makes sure every visitor holds a CSRF cookie.
pub struct CsrfMiddleware {
    secure: bool,
}

impl CsrfMiddleware {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CsrfMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = CsrfService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfService {
            service,
            secure: self.secure,
        }))
    }
}

pub struct CsrfService<S> {
    service: S,
    secure: bool,
}

impl<S, B> Service<ServiceRequest> for CsrfService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let existing = req
            .cookie(CSRF_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());

        let token = match existing {
            Some(value) => CsrfToken {
                value,
                issued: false,
            },
            None => CsrfToken {
                value: Uuid::new_v4().simple().to_string(),
                issued: true,
            },
        };
        req.extensions_mut().insert(token.clone());

        let fut = self.service.call(req);
        let secure = self.secure;

        Box::pin(async move {
            let mut res = fut.await?;

            if token.issued {
                let cookie = Cookie::build(CSRF_COOKIE, token.value)
                    .path("/")
                    .same_site(SameSite::Lax)
                    .secure(secure)
                    .finish();
                if let Err(e) = res.response_mut().add_cookie(&cookie) {
                    tracing::warn!(error = %e, "Could not set CSRF cookie");
                }
            }

            Ok(res)
        })
    }
}

/// The visitor's CSRF token, for rendering into forms and checking submissions.
#[derive(Debug, Clone)]
pub struct CsrfToken {
    value: String,
    /// Generated for this request; the browser does not hold it yet.
    issued: bool,
}

impl CsrfToken {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Accept a submission only if it echoes the cookie the browser sent.
    pub fn verify(&self, submitted: &str) -> Result<(), AppError> {
        if self.issued || submitted.is_empty() || submitted != self.value {
            return Err(AppError::Csrf);
        }
        Ok(())
    }
}

impl actix_web::FromRequest for CsrfToken {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let token = req.extensions().get::<CsrfToken>().cloned();

        ready(token.ok_or_else(|| {
            tracing::error!("CsrfMiddleware is not installed");
            AppError::Internal("CSRF token unavailable".to_string())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(value: &str) -> CsrfToken {
        CsrfToken {
            value: value.to_string(),
            issued: false,
        }
    }

    #[test]
    fn matching_token_passes() {
        assert!(held("abc").verify("abc").is_ok());
    }

    #[test]
    fn mismatch_or_missing_token_fails() {
        assert!(matches!(held("abc").verify("abd"), Err(AppError::Csrf)));
        assert!(matches!(held("abc").verify(""), Err(AppError::Csrf)));
    }

    #[test]
    fn freshly_issued_token_cannot_vouch_for_a_submission() {
        let token = CsrfToken {
            value: "abc".to_string(),
            issued: true,
        };

        assert!(matches!(token.verify("abc"), Err(AppError::Csrf)));
    }
}
