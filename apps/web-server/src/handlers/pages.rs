//! Static pages and the fallback for unknown routes.

use actix_web::HttpResponse;

use super::render;
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::csrf::CsrfToken;
use crate::middleware::error::{AppError, AppResult};
use crate::templates::{AboutPage, Nav, RulesPage};

/// GET /pages/about/
pub async fn about(identity: OptionalIdentity, csrf: CsrfToken) -> AppResult<HttpResponse> {
    render(&AboutPage {
        nav: Nav::new(&identity.viewer(), csrf.as_str()),
    })
}

/// GET /pages/rules/
pub async fn rules(identity: OptionalIdentity, csrf: CsrfToken) -> AppResult<HttpResponse> {
    render(&RulesPage {
        nav: Nav::new(&identity.viewer(), csrf.as_str()),
    })
}

/// Default service: any route not matched above.
pub async fn not_found() -> AppResult<HttpResponse> {
    Err(AppError::NotFound)
}
