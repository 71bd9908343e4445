//! Paginated, filtered list state shared by every resource screen.

pub mod cache;
pub mod filters;
pub mod key;
pub mod mutation;
pub mod normalize;
pub mod pagination;
pub mod query;
pub mod retry;
pub mod transport;
