//! Persisted key/value stores (URL query string, local storage).
//!
//! # Design
//! - Reads are infallible: a failing backend reads as "absent".
//! - Writes are batched into a [`StorePatch`] so related keys land together
//!   (one history entry per patch in the browser).
//! - Components hold the store as `Rc<dyn KeyValueStore>`; there is no global.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// A single write inside a [`StorePatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreWrite {
    /// Set `key` to `value`.
    Set(String, String),
    /// Remove `key`.
    Remove(String),
}

/// Ordered batch of writes applied as one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorePatch {
    writes: Vec<StoreWrite>,
}

impl StorePatch {
    /// Empty patch.
    #[must_use]
    pub const fn new() -> Self {
        Self { writes: Vec::new() }
    }

    /// Append a `Set` write.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.writes.push(StoreWrite::Set(key.into(), value.into()));
        self
    }

    /// Append a `Remove` write.
    #[must_use]
    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.writes.push(StoreWrite::Remove(key.into()));
        self
    }

    /// Set `key` when `value` is non-blank, otherwise remove it.
    #[must_use]
    pub fn set_or_remove(self, key: impl Into<String>, value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.remove(key)
        } else {
            self.set(key, trimmed)
        }
    }

    /// Append every write of `other` after this patch's writes.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.writes.extend(other.writes);
        self
    }

    /// Writes in application order.
    #[must_use]
    pub fn writes(&self) -> &[StoreWrite] {
        &self.writes
    }

    /// Whether the patch carries no writes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Apply the writes to an ordered map.
    pub fn apply_to(&self, map: &mut BTreeMap<String, String>) {
        for write in &self.writes {
            match write {
                StoreWrite::Set(key, value) => {
                    map.insert(key.clone(), value.clone());
                }
                StoreWrite::Remove(key) => {
                    map.remove(key);
                }
            }
        }
    }
}

/// String key/value persistence surviving in-session navigation.
pub trait KeyValueStore {
    /// Read a key; storage failures read as `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Apply a batch of writes. Failures are logged by the implementation.
    fn commit(&self, patch: StorePatch);
}

/// In-memory store used by tests and as a fallback when browser storage is unavailable.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
    commits: Rc<Cell<usize>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `pairs`; seeding does not count as a commit.
    #[must_use]
    pub fn with_entries<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        store
            .entries
            .borrow_mut()
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        store
    }

    /// Number of non-empty patches committed so far.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits.get()
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn commit(&self, patch: StorePatch) {
        if patch.is_empty() {
            return;
        }
        patch.apply_to(&mut self.entries.borrow_mut());
        self.commits.set(self.commits.get() + 1);
    }
}

/// Shared store handle passed to stateful components.
pub type SharedStore = Rc<dyn KeyValueStore>;
