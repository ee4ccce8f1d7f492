//! # Blogicum Core
//!
//! The domain layer of Blogicum.
//! This crate contains the entities, the visibility and ownership rules and the
//! listing/pagination logic, with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod lookup;
pub mod pagination;
pub mod policy;
pub mod ports;

pub use error::{DomainError, RepoError};
pub use lookup::Lookup;
pub use pagination::{POSTS_PER_PAGE, Page, PageRequest};
pub use policy::{ListingScope, Viewer};
