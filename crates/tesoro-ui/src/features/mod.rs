//! Feature modules: list machinery, detail pages, resource screens and forms.

pub mod details;
pub mod forms;
pub mod lists;
pub mod resources;
