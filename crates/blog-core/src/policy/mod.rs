//! Who may see and who may change what.
//!
//! Every function here is a pure predicate over already-loaded entities and an
//! explicit `now`; listings reuse the same rules through [`ListingScope`].

mod listing;
mod ownership;
mod viewer;
mod visibility;

pub use listing::ListingScope;
pub use ownership::can_mutate;
pub use viewer::Viewer;
pub use visibility::{can_view, can_view_detail, is_public};
