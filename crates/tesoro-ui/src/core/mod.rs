//! Core, DOM-free primitives shared by the list features.
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod store;
