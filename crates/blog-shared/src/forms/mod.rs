//! HTML form payloads and their validation.
//!
//! Every form deserializes from `application/x-www-form-urlencoded` (the post
//! form is assembled from multipart fields instead) and carries the submitted
//! `csrf_token`.

mod account;
mod comment;
mod post;
mod profile;

use std::collections::BTreeMap;

use serde::Deserialize;

pub use account::{LoginForm, RegistrationForm};
pub use comment::CommentForm;
pub use post::{PUB_DATE_FORMAT, PostFields, PostForm};
pub use profile::ProfileForm;

/// Body of forms that only confirm an action: deletions and logout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmForm {
    pub csrf_token: String,
}

/// Longest accepted username, first/last name.
pub const NAME_MAX_LEN: usize = 150;

/// Longest accepted post title.
pub const TITLE_MAX_LEN: usize = 256;

/// Field errors collected while validating a form.
///
/// Keys are form field names; `__all__` holds errors not tied to one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("form has invalid fields: {errors:?}")]
pub struct FormErrors {
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    pub const NON_FIELD: &'static str = "__all__";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_default().push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(Self::NON_FIELD, message);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// First message for `field`, for inline display next to the input.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn non_field(&self) -> Option<&str> {
        self.first(Self::NON_FIELD)
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.keys().copied().collect()
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Trimmed value of a required text field.
pub(crate) fn required(
    errors: &mut FormErrors,
    field: &'static str,
    value: &str,
    max_len: Option<usize>,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "This field is required.");
    } else if let Some(max) = max_len {
        check_max_len(errors, field, value, max);
    }
    value.to_string()
}

pub(crate) fn check_max_len(errors: &mut FormErrors, field: &'static str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

/// Letters, digits and `@.+-_`, at most [`NAME_MAX_LEN`] characters.
pub(crate) fn check_username(errors: &mut FormErrors, field: &'static str, value: &str) -> String {
    let username = required(errors, field, value, Some(NAME_MAX_LEN));
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.is_empty() && !username.chars().all(allowed) {
        errors.add(
            field,
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
    username
}

/// Empty, or a single `@` with text on both sides and no whitespace.
pub(crate) fn check_email(errors: &mut FormErrors, field: &'static str, value: &str) -> String {
    let email = value.trim();
    if email.is_empty() {
        return String::new();
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        errors.add(field, "Enter a valid email address.");
    }
    email.to_string()
}
