use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::{FormErrors, TITLE_MAX_LEN, required};

/// Format of an HTML `datetime-local` input, interpreted as UTC.
pub const PUB_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Raw post form fields. The image travels separately as a file part.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub location: String,
    pub category: String,
    pub csrf_token: String,
}

/// A post form that passed field validation.
///
/// Whether `category_id`/`location_id` exist is for the caller to check.
#[derive(Debug, Clone, PartialEq)]
pub struct PostFields {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<i32>,
    pub category_id: Option<i32>,
}

impl PostForm {
    /// Blank form with the publication date preset to `now`.
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            pub_date: now.format(PUB_DATE_FORMAT).to_string(),
            ..Self::default()
        }
    }

    /// Set a form field by name; unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = value,
            "text" => self.text = value,
            "pub_date" => self.pub_date = value,
            "location" => self.location = value,
            "category" => self.category = value,
            "csrf_token" => self.csrf_token = value,
            _ => {}
        }
    }

    pub fn validate(&self) -> Result<PostFields, FormErrors> {
        let mut errors = FormErrors::new();

        let title = required(&mut errors, "title", &self.title, Some(TITLE_MAX_LEN));
        let text = required(&mut errors, "text", &self.text, None);
        let pub_date = parse_pub_date(&mut errors, &self.pub_date);
        let location_id = parse_choice(&mut errors, "location", &self.location);
        let category_id = parse_choice(&mut errors, "category", &self.category);

        match pub_date {
            Some(pub_date) => errors.finish(PostFields {
                title,
                text,
                pub_date,
                location_id,
                category_id,
            }),
            None => Err(errors),
        }
    }
}

fn parse_pub_date(errors: &mut FormErrors, raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add("pub_date", "This field is required.");
        return None;
    }
    // Browsers add seconds when the input has a `step` below one minute.
    let parsed = NaiveDateTime::parse_from_str(raw, PUB_DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"));
    match parsed {
        Ok(naive) => Some(naive.and_utc()),
        Err(_) => {
            errors.add("pub_date", "Enter a valid date/time.");
            None
        }
    }
}

/// Optional select box holding a row id; empty means "none".
fn parse_choice(errors: &mut FormErrors, field: &'static str, raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            errors.add(
                field,
                "Select a valid choice. That choice is not one of the available choices.",
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn filled() -> PostForm {
        PostForm {
            title: "  Sevastopol in December ".to_string(),
            text: "The morning glow is just beginning.".to_string(),
            pub_date: "2024-05-01T09:30".to_string(),
            location: String::new(),
            category: "3".to_string(),
            csrf_token: "token".to_string(),
        }
    }

    #[test]
    fn valid_form_is_cleaned() {
        let fields = filled().validate().unwrap();

        assert_eq!(fields.title, "Sevastopol in December");
        assert_eq!(
            fields.pub_date,
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
        );
        assert_eq!(fields.category_id, Some(3));
        assert_eq!(fields.location_id, None);
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let form = PostForm {
            title: String::new(),
            text: "   ".to_string(),
            pub_date: String::new(),
            ..filled()
        };

        let errors = form.validate().unwrap_err();

        assert_eq!(errors.fields(), vec!["pub_date", "text", "title"]);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let form = PostForm {
            title: "t".repeat(TITLE_MAX_LEN + 1),
            pub_date: "01.05.2024 09:30".to_string(),
            category: "travel".to_string(),
            location: "-1".to_string(),
            ..filled()
        };

        let errors = form.validate().unwrap_err();

        for field in ["title", "pub_date", "category", "location"] {
            assert!(errors.has(field), "{field} should be invalid");
        }
    }

    #[test]
    fn seconds_are_accepted() {
        let form = PostForm {
            pub_date: "2024-05-01T09:30:15".to_string(),
            ..filled()
        };

        assert!(form.validate().is_ok());
    }

    #[test]
    fn initial_form_round_trips_its_date() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let form = PostForm {
            title: "t".to_string(),
            text: "x".to_string(),
            ..PostForm::initial(now)
        };

        assert_eq!(form.pub_date, "2024-05-01T09:30");
        assert_eq!(form.validate().unwrap().pub_date, now);
    }

    #[test]
    fn set_assigns_known_fields_only() {
        let mut form = PostForm::default();
        form.set("title", "Hello".to_string());
        form.set("image", "ignored".to_string());

        assert_eq!(form.title, "Hello");
    }
}
