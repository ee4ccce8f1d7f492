use chrono::{DateTime, Utc};

use crate::domain::{Category, CategoryId, Post, User, UserId};
use crate::lookup::Lookup;

use super::{Viewer, is_public};

/// Which posts a listing page contains.
///
/// The database layer translates a scope into a `WHERE` clause;
/// [`ListingScope::admits`] is the row-by-row definition it must agree with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingScope {
    /// Index page: every public post.
    Public,
    /// Public posts of one (published) category.
    Category(CategoryId),
    /// Posts of one author. `include_hidden` lifts every publication filter.
    Profile {
        author_id: UserId,
        include_hidden: bool,
    },
}

impl ListingScope {
    /// Scope for a category page. Unpublished categories have no page at all.
    pub fn for_category(category: &Category) -> Lookup<Self> {
        if category.is_published {
            Lookup::Found(ListingScope::Category(category.id))
        } else {
            Lookup::NotFound
        }
    }

    /// Scope for `owner`'s profile page as seen by `viewer`.
    ///
    /// Ownership of the page is decided by username, not by id, so `viewer`
    /// must carry the username as currently stored.
    pub fn for_profile(viewer: &Viewer, owner: &User) -> Self {
        ListingScope::Profile {
            author_id: owner.id,
            include_hidden: viewer.username() == Some(owner.username.as_str()),
        }
    }

    /// Whether the public visibility filter applies to this scope.
    pub fn filters_hidden(&self) -> bool {
        !matches!(
            self,
            ListingScope::Profile {
                include_hidden: true,
                ..
            }
        )
    }

    /// Whether `post` (with its resolved category) belongs to the listing at `now`.
    pub fn admits(&self, post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
        let in_scope = match self {
            ListingScope::Public => true,
            ListingScope::Category(id) => post.category_id == Some(*id),
            ListingScope::Profile { author_id, .. } => post.author_id == *author_id,
        };
        in_scope && (!self.filters_hidden() || is_public(post, category, now))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn user(id: i32, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn category(id: i32, is_published: bool) -> Category {
        Category {
            id,
            title: format!("Category {id}"),
            description: String::new(),
            slug: format!("category-{id}"),
            is_published,
            created_at: Utc::now(),
        }
    }

    fn post(author_id: i32, category_id: Option<i32>, is_published: bool, offset: Duration) -> Post {
        Post {
            id: 1,
            title: "T".to_string(),
            text: "B".to_string(),
            pub_date: Utc::now() + offset,
            author_id,
            location_id: None,
            category_id,
            image: None,
            is_published,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unpublished_category_has_no_listing() {
        assert_eq!(
            ListingScope::for_category(&category(3, true)),
            Lookup::Found(ListingScope::Category(3))
        );
        assert_eq!(
            ListingScope::for_category(&category(3, false)),
            Lookup::NotFound
        );
    }

    #[test]
    fn test_own_profile_lifts_filters() {
        let owner = user(1, "anna");
        let own = ListingScope::for_profile(&Viewer::user(1, "anna"), &owner);
        let other = ListingScope::for_profile(&Viewer::user(2, "boris"), &owner);
        let anonymous = ListingScope::for_profile(&Viewer::Anonymous, &owner);

        assert!(!own.filters_hidden());
        assert!(other.filters_hidden());
        assert!(anonymous.filters_hidden());

        let now = Utc::now();
        let draft = post(1, None, false, Duration::days(1));
        assert!(own.admits(&draft, None, now));
        assert!(!other.admits(&draft, None, now));
    }

    #[test]
    fn test_own_profile_is_superset() {
        let owner = user(1, "anna");
        let own = ListingScope::for_profile(&Viewer::user(1, "anna"), &owner);
        let other = ListingScope::for_profile(&Viewer::user(2, "boris"), &owner);
        let now = Utc::now();
        let hidden = category(9, false);
        let shown = category(8, true);

        for is_published in [true, false] {
            for offset in [Duration::hours(-1), Duration::hours(1)] {
                for cat in [None, Some(&shown), Some(&hidden)] {
                    for author in [1, 2] {
                        let p = post(author, cat.map(|c| c.id), is_published, offset);
                        if other.admits(&p, cat, now) {
                            assert!(own.admits(&p, cat, now));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_category_scope_requires_matching_public_post() {
        let scope = ListingScope::Category(8);
        let shown = category(8, true);
        let now = Utc::now();
        assert!(scope.admits(&post(1, Some(8), true, Duration::hours(-1)), Some(&shown), now));
        assert!(!scope.admits(&post(1, Some(7), true, Duration::hours(-1)), None, now));
        assert!(!scope.admits(&post(1, Some(8), false, Duration::hours(-1)), Some(&shown), now));
        assert!(!scope.admits(&post(1, None, true, Duration::hours(-1)), None, now));
    }
}
