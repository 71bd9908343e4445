//! Per-resource list screens built on the shared list machinery.

pub mod screen;
pub mod specs;

pub use screen::ListScreen;
pub use specs::ListSpec;
