//! HTTP handlers and route configuration.

mod auth;
mod comments;
pub mod guard;
mod health;
pub mod pages;
mod posts;
mod profiles;

#[cfg(test)]
mod tests;

use actix_web::{HttpRequest, HttpResponse, web};
use askama::Template;
use serde::Deserialize;

use blog_core::pagination::PageRequest;

use crate::middleware::error::{AppError, AppResult};

/// `?page=` of listing pages.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn request(&self) -> AppResult<PageRequest> {
        Ok(PageRequest::parse(self.page.as_deref())?)
    }
}

/// Render `page` as a 200 HTML response.
pub fn render<T: Template>(page: &T) -> AppResult<HttpResponse> {
    let body = page.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

/// Path of `username`'s profile page, percent-encoded.
pub fn profile_path(req: &HttpRequest, username: &str) -> AppResult<String> {
    req.url_for("profile", [username])
        .map(|url| url.path().to_string())
        .map_err(|e| AppError::Internal(format!("Cannot build profile URL: {e}")))
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Malformed ids such as `/posts/abc/` get the regular 404 page.
    cfg.app_data(web::PathConfig::default().error_handler(|_, _| AppError::NotFound.into()))
        .route("/", web::get().to(posts::index))
        .route("/health", web::get().to(health::health_check))
        .route("/category/{slug}/", web::get().to(posts::category_posts))
        .service(
            web::scope("/posts")
                .service(
                    web::resource("/create/")
                        .route(web::get().to(posts::create_form))
                        .route(web::post().to(posts::create_post)),
                )
                .route("/{id}/", web::get().to(posts::post_detail))
                .service(
                    web::resource("/{id}/edit/")
                        .route(web::get().to(posts::edit_form))
                        .route(web::post().to(posts::edit_post)),
                )
                .service(
                    web::resource("/{id}/delete/")
                        .route(web::get().to(posts::delete_form))
                        .route(web::post().to(posts::delete_post)),
                )
                .route("/{id}/comment/", web::post().to(comments::add_comment))
                .service(
                    web::resource("/{id}/edit_comment/{comment_id}/")
                        .route(web::get().to(comments::edit_form))
                        .route(web::post().to(comments::edit_comment)),
                )
                .service(
                    web::resource("/{id}/delete_comment/{comment_id}/")
                        .route(web::get().to(comments::delete_form))
                        .route(web::post().to(comments::delete_comment)),
                ),
        )
        .service(
            web::resource("/profile/{username}/")
                .name("profile")
                .route(web::get().to(profiles::profile)),
        )
        .service(
            web::resource("/edit_profile/")
                .route(web::get().to(profiles::edit_form))
                .route(web::post().to(profiles::edit_profile)),
        )
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/registration/")
                        .route(web::get().to(auth::registration_form))
                        .route(web::post().to(auth::register)),
                )
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_form))
                        .route(web::post().to(auth::login)),
                )
                .route("/logout/", web::post().to(auth::logout)),
        )
        .service(
            web::scope("/pages")
                .route("/about/", web::get().to(pages::about))
                .route("/rules/", web::get().to(pages::rules)),
        );
}
