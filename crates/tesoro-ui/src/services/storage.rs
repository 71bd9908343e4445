//! [`KeyValueStore`] adapters for the URL query string and `localStorage`.
//!
//! # Design
//! - Read failures look like missing keys; write failures are logged to the console and dropped.
//! - A URL patch is one `history.replaceState` call, so a filter change and its page
//!   reset never appear as two navigations.

use gloo::console;
use gloo::storage::{LocalStorage, Storage};
use gloo::utils::window;
use wasm_bindgen::JsValue;
use web_sys::UrlSearchParams;

use crate::core::store::{KeyValueStore, StorePatch, StoreWrite};

/// List state persisted in `window.location.search`.
#[derive(Clone, Copy, Debug, Default)]
pub struct UrlQueryStore;

impl UrlQueryStore {
    fn params() -> Result<UrlSearchParams, JsValue> {
        let search = window().location().search()?;
        UrlSearchParams::new_with_str(&search)
    }

    fn apply(patch: &StorePatch) -> Result<(), JsValue> {
        let params = Self::params()?;
        for write in patch.writes() {
            match write {
                StoreWrite::Set(key, value) => params.set(key, value),
                StoreWrite::Remove(key) => params.delete(key),
            }
        }
        let location = window().location();
        let path = location.pathname()?;
        let query = String::from(params.to_string());
        let url = if query.is_empty() {
            path
        } else {
            format!("{path}?{query}")
        };
        window()
            .history()?
            .replace_state_with_url(&JsValue::NULL, "", Some(&url))
    }
}

impl KeyValueStore for UrlQueryStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::params().ok()?.get(key)
    }

    fn commit(&self, patch: StorePatch) {
        if patch.is_empty() {
            return;
        }
        if let Err(err) = Self::apply(&patch) {
            console::error!("failed to update URL query", err);
        }
    }
}

/// Session state persisted in `localStorage`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStore;

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::get::<String>(key).ok()
    }

    fn commit(&self, patch: StorePatch) {
        for write in patch.writes() {
            match write {
                StoreWrite::Set(key, value) => {
                    if let Err(err) = LocalStorage::set(key, value) {
                        console::error!("failed to persist", key.as_str(), err.to_string());
                    }
                }
                StoreWrite::Remove(key) => LocalStorage::delete(key),
            }
        }
    }
}
