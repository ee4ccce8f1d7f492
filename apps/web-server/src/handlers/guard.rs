//! Per-handler access checks.
//!
//! A handler declares what it needs in a [`HandlerConfig`] and runs the checks
//! in a fixed order: authentication, lookup, visibility, ownership.

use actix_web::{HttpResponse, http::header};

use blog_core::domain::{Authored, PostId};
use blog_core::lookup::Lookup;
use blog_core::policy::{Viewer, can_mutate};

use crate::middleware::error::{AppError, AppResult};

/// What a handler requires before it does any work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerConfig {
    pub requires_auth: bool,
    pub ownership_check: bool,
    pub visibility_check: bool,
    /// Page name, used in logs.
    pub template: &'static str,
}

/// Outcome of the guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    RedirectToLogin,
    NotFound,
    /// Not the author: back to the post, nothing changes.
    RedirectToPost(PostId),
}

impl HandlerConfig {
    pub const fn public(template: &'static str) -> Self {
        Self {
            requires_auth: false,
            ownership_check: false,
            visibility_check: false,
            template,
        }
    }

    pub const fn authenticated(template: &'static str) -> Self {
        Self {
            requires_auth: true,
            ..Self::public(template)
        }
    }

    /// Authenticated and restricted to the author of the target.
    pub const fn owner_only(template: &'static str) -> Self {
        Self {
            ownership_check: true,
            ..Self::authenticated(template)
        }
    }

    pub const fn with_visibility(self) -> Self {
        Self {
            visibility_check: true,
            ..self
        }
    }

    /// Authentication alone, for handlers without a target entity.
    pub fn authenticate(&self, viewer: &Viewer) -> Verdict {
        if self.requires_auth && !viewer.is_authenticated() {
            tracing::debug!(page = self.template, "Login required");
            return Verdict::RedirectToLogin;
        }
        Verdict::Proceed
    }

    /// Every check against `target`. Non-authors are sent back to `post_id`.
    pub fn evaluate<T>(
        &self,
        viewer: &Viewer,
        target: &Lookup<T>,
        is_visible: impl FnOnce(&T) -> bool,
        post_id: PostId,
    ) -> Verdict
    where
        T: Authored,
    {
        let verdict = self.authenticate(viewer);
        if verdict != Verdict::Proceed {
            return verdict;
        }

        let Lookup::Found(entity) = target else {
            return Verdict::NotFound;
        };

        if self.visibility_check && !is_visible(entity) {
            return Verdict::NotFound;
        }

        if self.ownership_check && !can_mutate(viewer, entity) {
            tracing::debug!(page = self.template, post_id, "Not the author, redirecting");
            return Verdict::RedirectToPost(post_id);
        }

        Verdict::Proceed
    }
}

/// A target that passed every check, or the response to send instead.
pub enum Admission<T> {
    Granted(T),
    Redirect(HttpResponse),
}

impl HandlerConfig {
    /// [`HandlerConfig::evaluate`], handing back the target on success.
    pub fn admit<T>(
        &self,
        viewer: &Viewer,
        target: Lookup<T>,
        is_visible: impl FnOnce(&T) -> bool,
        post_id: PostId,
        next: &str,
    ) -> AppResult<Admission<T>>
    where
        T: Authored,
    {
        match self.evaluate(viewer, &target, is_visible, post_id).rejection(next) {
            Some(rejection) => rejection.map(Admission::Redirect),
            None => target
                .found_or(|| AppError::NotFound)
                .map(Admission::Granted),
        }
    }
}

impl Verdict {
    /// The response for a failed check, or `None` to carry on.
    ///
    /// `next` is the path to come back to after logging in.
    pub fn rejection(self, next: &str) -> Option<AppResult<HttpResponse>> {
        match self {
            Verdict::Proceed => None,
            Verdict::RedirectToLogin => Some(Err(AppError::Unauthenticated {
                next: next.to_string(),
            })),
            Verdict::NotFound => Some(Err(AppError::NotFound)),
            Verdict::RedirectToPost(id) => Some(Ok(redirect(&format!("/posts/{id}/")))),
        }
    }
}

/// 303 See Other to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note {
        author: i32,
        public: bool,
    }

    impl Authored for Note {
        fn author_id(&self) -> i32 {
            self.author
        }
    }

    const EDIT: HandlerConfig = HandlerConfig::owner_only("edit");
    const READ: HandlerConfig = HandlerConfig::public("read").with_visibility();

    fn note(author: i32, public: bool) -> Lookup<Note> {
        Lookup::Found(Note { author, public })
    }

    fn visible(n: &Note) -> bool {
        n.public
    }

    #[test]
    fn anonymous_is_sent_to_login_before_lookup() {
        let verdict = EDIT.evaluate(&Viewer::Anonymous, &Lookup::<Note>::NotFound, visible, 5);

        assert_eq!(verdict, Verdict::RedirectToLogin);
    }

    #[test]
    fn missing_target_is_not_found() {
        let verdict = EDIT.evaluate(&Viewer::user(1, "a"), &Lookup::<Note>::NotFound, visible, 5);

        assert_eq!(verdict, Verdict::NotFound);
    }

    #[test]
    fn non_author_is_redirected_to_post() {
        let verdict = EDIT.evaluate(&Viewer::user(2, "b"), &note(1, true), visible, 5);

        assert_eq!(verdict, Verdict::RedirectToPost(5));
    }

    #[test]
    fn author_proceeds() {
        let verdict = EDIT.evaluate(&Viewer::user(1, "a"), &note(1, false), visible, 5);

        assert_eq!(verdict, Verdict::Proceed);
    }

    #[test]
    fn invisible_target_is_not_found_for_readers() {
        let hidden = note(1, false);

        assert_eq!(
            READ.evaluate(&Viewer::Anonymous, &hidden, visible, 5),
            Verdict::NotFound
        );
        assert_eq!(
            READ.evaluate(&Viewer::Anonymous, &note(1, true), visible, 5),
            Verdict::Proceed
        );
    }

    #[test]
    fn admit_hands_back_the_target() {
        let granted = EDIT
            .admit(&Viewer::user(1, "a"), note(1, true), visible, 5, "/")
            .unwrap();
        let redirected = EDIT
            .admit(&Viewer::user(2, "b"), note(1, true), visible, 5, "/")
            .unwrap();

        assert!(matches!(granted, Admission::Granted(Note { author: 1, .. })));
        assert!(matches!(redirected, Admission::Redirect(_)));
    }

    #[test]
    fn rejection_maps_verdicts_to_responses() {
        assert!(Verdict::Proceed.rejection("/").is_none());
        assert!(matches!(
            Verdict::NotFound.rejection("/"),
            Some(Err(AppError::NotFound))
        ));

        let response = Verdict::RedirectToPost(9).rejection("/").unwrap().unwrap();
        assert_eq!(response.status(), actix_web::http::StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/posts/9/");
    }
}
