use serde::Deserialize;

use super::{FormErrors, required};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
    pub csrf_token: String,
}

impl CommentForm {
    /// The trimmed comment text.
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        let text = required(&mut errors, "text", &self.text, None);
        errors.finish(text)
    }
}
