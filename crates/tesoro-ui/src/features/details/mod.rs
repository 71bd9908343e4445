//! Single-record detail pages and the revenue summary, cached beside the lists.

pub mod key;
pub mod query;
