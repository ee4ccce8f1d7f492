use serde::Deserialize;

use super::{FormErrors, check_username};

/// Shortest accepted password.
pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub csrf_token: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::new();
        let username = self.username.trim().to_string();
        if username.is_empty() {
            errors.add("username", "This field is required.");
        }
        if self.password.is_empty() {
            errors.add("password", "This field is required.");
        }
        errors.finish((username, self.password.clone()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
    pub csrf_token: String,
}

impl RegistrationForm {
    /// Username and password; whether the username is free needs the user table.
    pub fn validate(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::new();

        let username = check_username(&mut errors, "username", &self.username);

        if self.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."
                ),
            );
        }
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.finish((username, self.password1.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(password1: &str, password2: &str) -> RegistrationForm {
        RegistrationForm {
            username: "leo".to_string(),
            password1: password1.to_string(),
            password2: password2.to_string(),
            csrf_token: String::new(),
        }
    }

    #[test]
    fn registration_accepts_matching_passwords() {
        let (username, password) = registration("war-and-peace", "war-and-peace")
            .validate()
            .unwrap();

        assert_eq!(username, "leo");
        assert_eq!(password, "war-and-peace");
    }

    #[test]
    fn registration_rejects_short_or_mismatched_passwords() {
        let short = registration("short", "short").validate().unwrap_err();
        let mismatch = registration("long-enough", "long-enougH")
            .validate()
            .unwrap_err();

        assert!(short.has("password1"));
        assert!(mismatch.has("password2"));
    }

    #[test]
    fn login_requires_both_fields() {
        let errors = LoginForm::default().validate().unwrap_err();

        assert_eq!(errors.fields(), vec!["password", "username"]);
    }
}
