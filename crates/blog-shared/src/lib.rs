//! # Blogicum Shared
//!
//! Form payloads with their field validation, and page-link helpers.
//! Nothing here touches the database: checks that need it (existing
//! category, free username) are layered on by the server.

pub mod forms;
pub mod paging;

pub use forms::{
    CommentForm, ConfirmForm, FormErrors, LoginForm, PUB_DATE_FORMAT, PostFields, PostForm,
    ProfileForm, RegistrationForm,
};
pub use paging::PageLinks;
