#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]
//! Shared HTTP DTOs for the Tesoro admin API.
//!
//! The admin client only depends on a handful of envelope conventions; the
//! resource-specific payloads stay opaque [`Record`] maps so new backend fields
//! flow through without a model change.

mod auth;
mod list;
mod record;
mod resource;

pub use auth::{LOGIN_PATH, LoginRequest, LoginResponse};
pub use list::{ErrorBody, ListParams, ListResult, DEFAULT_ERROR_MESSAGE};
pub use record::Record;
pub use resource::{ParseResourceError, REVENUE_SUMMARY_PATH, ResourceKind};

/// Resolve the first JSON pointer in `paths` that yields a value accepted by `accept`.
///
/// Paths are tried in order, so callers express priority by position.
pub fn first_match<'a, T>(
    value: &'a serde_json::Value,
    paths: &[&str],
    accept: impl Fn(&'a serde_json::Value) -> Option<T>,
) -> Option<T> {
    paths
        .iter()
        .filter_map(|path| value.pointer(path))
        .find_map(accept)
}
