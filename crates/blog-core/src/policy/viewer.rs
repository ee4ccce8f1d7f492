use crate::domain::{Author, UserId};

/// The party a request is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(Author),
}

impl Viewer {
    pub fn user(id: UserId, username: impl Into<String>) -> Self {
        Viewer::User(Author {
            id,
            username: username.into(),
        })
    }

    pub fn id(&self) -> Option<UserId> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(author) => Some(author.id),
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(author) => Some(author.username.as_str()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Viewer::User(_))
    }

    /// True when the viewer is the user `id`.
    pub fn is(&self, id: UserId) -> bool {
        self.id() == Some(id)
    }
}
