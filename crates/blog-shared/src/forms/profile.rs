use serde::Deserialize;

use super::{FormErrors, NAME_MAX_LEN, check_email, check_max_len, check_username};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub csrf_token: String,
}

impl ProfileForm {
    /// Field checks only; whether the username is free needs the user table.
    pub fn validate(&self) -> Result<ProfileForm, FormErrors> {
        let mut errors = FormErrors::new();

        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        check_max_len(&mut errors, "first_name", &first_name, NAME_MAX_LEN);
        check_max_len(&mut errors, "last_name", &last_name, NAME_MAX_LEN);
        let username = check_username(&mut errors, "username", &self.username);
        let email = check_email(&mut errors, "email", &self.email);

        errors.finish(ProfileForm {
            first_name,
            last_name,
            username,
            email,
            csrf_token: self.csrf_token.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_may_be_empty() {
        let form = ProfileForm {
            username: "leo".to_string(),
            ..Default::default()
        };

        let cleaned = form.validate().unwrap();

        assert_eq!(cleaned.first_name, "");
        assert_eq!(cleaned.email, "");
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let form = ProfileForm {
            first_name: "n".repeat(NAME_MAX_LEN + 1),
            last_name: "Tolstoy".to_string(),
            username: "bad name".to_string(),
            email: "nowhere".to_string(),
            csrf_token: String::new(),
        };

        let errors = form.validate().unwrap_err();

        assert_eq!(errors.fields(), vec!["email", "first_name", "username"]);
    }
}
