//! Browser bindings for the DOM-free core: HTTP, storage and timers.

pub mod api;
pub mod clock;
pub mod storage;

pub use api::ApiClient;
pub use clock::BrowserClock;
pub use storage::{LocalStore, UrlQueryStore};
