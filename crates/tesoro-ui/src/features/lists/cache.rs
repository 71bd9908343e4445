//! Query cache shared by list, detail and mutation controllers.
//!
//! # Design
//! - Entries move `Fresh -> Stale -> Refreshing -> Fresh`; stale entries keep
//!   serving data until the refetch lands.
//! - Optimistic patches remember only the previous value of the patched field,
//!   so a rollback never touches other records or the entry's freshness.
//! - Each resource carries a fetch epoch. Starting a mutation bumps it, which
//!   supersedes every fetch of that resource issued earlier.
//! - The cache is single-threaded state behind `Rc<RefCell<_>>`; borrows never
//!   live across an `.await`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use tesoro_api_models::{ListResult, ResourceKind};
use tracing::debug;

use crate::core::config::UiConfig;
use crate::features::details::key::DetailKey;
use crate::features::lists::key::QueryKey;

/// Freshness of a cached page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Loaded recently and not invalidated.
    Fresh,
    /// Invalidated or aged out; refetched on next access.
    Stale,
    /// A background refetch is in flight.
    Refreshing,
}

impl Freshness {
    const fn is_due(self, updated_at_ms: u64, now_ms: u64, stale_time_ms: u64) -> bool {
        match self {
            Self::Stale => true,
            Self::Refreshing => false,
            Self::Fresh => now_ms.saturating_sub(updated_at_ms) >= stale_time_ms,
        }
    }
}

/// Last known result for a key.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    /// Normalized rows and total.
    pub result: ListResult,
    /// Freshness state.
    pub freshness: Freshness,
    /// When the result was stored.
    pub updated_at_ms: u64,
}

/// Last known payload for a detail or summary key.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailEntry {
    /// Response body as returned by the backend.
    pub value: Value,
    /// Freshness state.
    pub freshness: Freshness,
    /// When the value was stored.
    pub updated_at_ms: u64,
}

/// Previous value of a field overwritten by [`QueryCache::patch_record`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSnapshot {
    /// Value before the patch; `None` when the field was absent.
    pub previous: Option<Value>,
}

/// Map of cached pages and detail payloads.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    details: HashMap<DetailKey, DetailEntry>,
    epochs: HashMap<ResourceKind, u64>,
    stale_time_ms: u64,
}

impl QueryCache {
    /// Empty cache; fresh entries age out after `stale_time_ms`.
    #[must_use]
    pub fn new(stale_time_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            details: HashMap::new(),
            epochs: HashMap::new(),
            stale_time_ms,
        }
    }

    /// Entry for `key`.
    #[must_use]
    pub fn get(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Number of cached pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no page is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store a successful fetch as fresh.
    pub fn store_fetched(&mut self, key: QueryKey, result: ListResult, now_ms: u64) {
        debug!(key = %key, rows = result.items.len(), total = result.total, "cache entry stored");
        self.entries.insert(
            key,
            CacheEntry {
                result,
                freshness: Freshness::Fresh,
                updated_at_ms: now_ms,
            },
        );
    }

    /// Mark one entry stale. Returns `false` when the key is not cached.
    pub fn mark_stale(&mut self, key: &QueryKey) -> bool {
        self.entries.get_mut(key).is_some_and(|entry| {
            entry.freshness = Freshness::Stale;
            true
        })
    }

    /// Mark every page of `resource` stale; returns how many were touched.
    pub fn invalidate_resource(&mut self, resource: ResourceKind) -> usize {
        let mut touched = 0;
        for (key, entry) in &mut self.entries {
            if key.resource() == resource {
                entry.freshness = Freshness::Stale;
                touched += 1;
            }
        }
        debug!(resource = %resource, touched, "cache invalidated");
        touched
    }

    /// Flag an entry as refreshing. Returns `false` when the key is not cached.
    pub fn begin_refresh(&mut self, key: &QueryKey) -> bool {
        self.entries.get_mut(key).is_some_and(|entry| {
            entry.freshness = Freshness::Refreshing;
            true
        })
    }

    /// A refresh failed or was dropped: keep the data, fall back to stale so the next access retries.
    pub fn abort_refresh(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key)
            && entry.freshness == Freshness::Refreshing
        {
            entry.freshness = Freshness::Stale;
        }
    }

    /// Whether accessing `key` at `now_ms` should trigger a fetch.
    #[must_use]
    pub fn needs_fetch(&self, key: &QueryKey, now_ms: u64) -> bool {
        self.entries.get(key).is_none_or(|entry| {
            entry
                .freshness
                .is_due(entry.updated_at_ms, now_ms, self.stale_time_ms)
        })
    }

    /// Set `field` on the record with `id` under `key`, returning the field's previous value.
    ///
    /// Returns `None` (and changes nothing) when the key is not cached or the
    /// record is not on that page.
    pub fn patch_record(
        &mut self,
        key: &QueryKey,
        id: &str,
        field: &str,
        value: Value,
    ) -> Option<FieldSnapshot> {
        let record = self.entries.get_mut(key)?.result.find_mut(id)?;
        let previous = record.set_field(field, value);
        Some(FieldSnapshot { previous })
    }

    /// Undo a [`Self::patch_record`] on whatever entry is cached under `key` now.
    ///
    /// Only `field` of record `id` changes. Returns `false` when the page or the
    /// record is gone.
    pub fn revert_field(
        &mut self,
        key: &QueryKey,
        id: &str,
        field: &str,
        snapshot: FieldSnapshot,
    ) -> bool {
        let Some(record) = self
            .entries
            .get_mut(key)
            .and_then(|entry| entry.result.find_mut(id))
        else {
            return false;
        };
        record.replace_field(field, snapshot.previous);
        true
    }

    /// Current fetch epoch of `resource`.
    #[must_use]
    pub fn fetch_epoch(&self, resource: ResourceKind) -> u64 {
        self.epochs.get(&resource).copied().unwrap_or(0)
    }

    /// Supersede every in-flight fetch of `resource`.
    ///
    /// Refreshing entries of the resource fall back to stale so they refetch
    /// once a newer fetch is allowed to land.
    pub fn supersede_fetches(&mut self, resource: ResourceKind) -> u64 {
        let epoch = self.epochs.entry(resource).or_insert(0);
        *epoch += 1;
        let epoch = *epoch;
        for (key, entry) in &mut self.entries {
            if key.resource() == resource && entry.freshness == Freshness::Refreshing {
                entry.freshness = Freshness::Stale;
            }
        }
        for (key, entry) in &mut self.details {
            if key.resource() == resource && entry.freshness == Freshness::Refreshing {
                entry.freshness = Freshness::Stale;
            }
        }
        debug!(resource = %resource, epoch, "in-flight fetches superseded");
        epoch
    }

    /// Detail entry for `key`.
    #[must_use]
    pub fn detail(&self, key: &DetailKey) -> Option<&DetailEntry> {
        self.details.get(key)
    }

    /// Store a successful detail fetch as fresh.
    pub fn store_detail(&mut self, key: DetailKey, value: Value, now_ms: u64) {
        debug!(key = %key, "detail entry stored");
        self.details.insert(
            key,
            DetailEntry {
                value,
                freshness: Freshness::Fresh,
                updated_at_ms: now_ms,
            },
        );
    }

    /// Mark one detail entry stale. Returns `false` when the key is not cached.
    pub fn invalidate_detail(&mut self, key: &DetailKey) -> bool {
        self.details.get_mut(key).is_some_and(|entry| {
            entry.freshness = Freshness::Stale;
            true
        })
    }

    /// Flag a detail entry as refreshing.
    pub fn begin_detail_refresh(&mut self, key: &DetailKey) -> bool {
        self.details.get_mut(key).is_some_and(|entry| {
            entry.freshness = Freshness::Refreshing;
            true
        })
    }

    /// Detail counterpart of [`Self::abort_refresh`].
    pub fn abort_detail_refresh(&mut self, key: &DetailKey) {
        if let Some(entry) = self.details.get_mut(key)
            && entry.freshness == Freshness::Refreshing
        {
            entry.freshness = Freshness::Stale;
        }
    }

    /// Whether accessing the detail `key` at `now_ms` should trigger a fetch.
    #[must_use]
    pub fn detail_needs_fetch(&self, key: &DetailKey, now_ms: u64) -> bool {
        self.details.get(key).is_none_or(|entry| {
            entry
                .freshness
                .is_due(entry.updated_at_ms, now_ms, self.stale_time_ms)
        })
    }
}

/// Cloneable handle to the shared cache plus client configuration.
#[derive(Clone)]
pub struct QueryClient {
    cache: Rc<RefCell<QueryCache>>,
    config: Rc<UiConfig>,
}

impl QueryClient {
    /// Client with an empty cache.
    #[must_use]
    pub fn new(config: UiConfig) -> Self {
        Self {
            cache: Rc::new(RefCell::new(QueryCache::new(config.stale_time_ms))),
            config: Rc::new(config),
        }
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    /// Read the cache.
    pub fn read<R>(&self, read: impl FnOnce(&QueryCache) -> R) -> R {
        read(&self.cache.borrow())
    }

    /// Mutate the cache.
    pub fn write<R>(&self, write: impl FnOnce(&mut QueryCache) -> R) -> R {
        write(&mut self.cache.borrow_mut())
    }

    /// Clone of the entry for `key`.
    #[must_use]
    pub fn entry(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.read(|cache| cache.get(key).cloned())
    }

    /// Clone of the detail entry for `key`.
    #[must_use]
    pub fn detail(&self, key: &DetailKey) -> Option<DetailEntry> {
        self.read(|cache| cache.detail(key).cloned())
    }

    /// Mark every cached page of `resource` stale.
    pub fn invalidate(&self, resource: ResourceKind) -> usize {
        self.write(|cache| cache.invalidate_resource(resource))
    }
}

impl PartialEq for QueryClient {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cache, &other.cache)
    }
}
