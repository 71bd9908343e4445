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
//! Tesoro admin dashboard state.
//!
//! Paginated, filtered resource lists with a shared query cache, retrying
//! fetches and optimistic toggles. Everything under [`core`] and [`features`]
//! is DOM-free and tested natively; browser bindings live in `services` and
//! only build for `wasm32`.

pub mod core;
pub mod features;

#[cfg(target_arch = "wasm32")]
pub mod services;

pub use crate::core::config::UiConfig;
pub use crate::core::error::UiError;
pub use crate::features::lists::cache::QueryClient;
pub use crate::features::resources::{ListScreen, ListSpec};
