use crate::domain::Authored;

use super::Viewer;

/// Only the author may edit or delete a post or a comment.
pub fn can_mutate<E: Authored + ?Sized>(viewer: &Viewer, entity: &E) -> bool {
    viewer.is(entity.author_id())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{Comment, Post};

    fn post(author_id: i32) -> Post {
        Post {
            id: 1,
            title: "T".to_string(),
            text: "B".to_string(),
            pub_date: Utc::now(),
            author_id,
            location_id: None,
            category_id: None,
            image: None,
            is_published: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_author_may_mutate_post() {
        let post = post(10);
        assert!(can_mutate(&Viewer::user(10, "owner"), &post));
        assert!(!can_mutate(&Viewer::user(11, "other"), &post));
        assert!(!can_mutate(&Viewer::Anonymous, &post));
    }

    #[test]
    fn test_only_author_may_mutate_comment() {
        let comment = Comment {
            id: 3,
            text: "hi".to_string(),
            post_id: 1,
            author_id: 20,
            created_at: Utc::now(),
        };
        assert!(can_mutate(&Viewer::user(20, "commenter"), &comment));
        // The post author gets no rights over other people's comments.
        assert!(!can_mutate(&Viewer::user(10, "owner"), &comment));
    }

    #[test]
    fn test_identity_is_by_id_not_username() {
        let post = post(10);
        assert!(!can_mutate(&Viewer::user(99, "owner"), &post));
    }
}
