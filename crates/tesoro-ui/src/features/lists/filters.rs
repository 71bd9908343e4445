//! Named list filters persisted next to pagination, with debounced free-text input.
//!
//! # Design
//! - An absent key and an empty value mean the same thing: no filter.
//! - Every committed change lands in one store patch together with a reset to page 1.
//! - Debounce is a small state machine driven by explicit timestamps, so tests
//!   never wait on real timers.

use tracing::{debug, info};

use crate::core::store::{SharedStore, StorePatch};
use crate::features::lists::pagination::Pagination;

/// Static description of one filter on a list screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterSpec {
    /// Query key and wire parameter name.
    pub name: &'static str,
    /// Whether edits go through a debounced draft.
    pub debounced: bool,
    /// Value used when nothing is stored.
    pub default: Option<&'static str>,
}

impl FilterSpec {
    /// Filter committed immediately on change (selects, toggles).
    #[must_use]
    pub const fn select(name: &'static str) -> Self {
        Self {
            name,
            debounced: false,
            default: None,
        }
    }

    /// Free-text filter committed after the debounce delay.
    #[must_use]
    pub const fn search(name: &'static str) -> Self {
        Self {
            name,
            debounced: true,
            default: None,
        }
    }

    /// Attach a default value.
    #[must_use]
    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }
}

/// Committed filter values over a persisted store.
#[derive(Clone)]
pub struct Filters {
    store: SharedStore,
    pagination: Pagination,
}

impl Filters {
    /// Filters sharing `store` with `pagination`.
    #[must_use]
    pub const fn new(store: SharedStore, pagination: Pagination) -> Self {
        Self { store, pagination }
    }

    /// Committed value, trimmed; empty when absent.
    #[must_use]
    pub fn value(&self, name: &str) -> String {
        self.store
            .get(name)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    }

    /// Committed value, falling back to the filter default.
    #[must_use]
    pub fn effective(&self, spec: &FilterSpec) -> String {
        let value = self.value(spec.name);
        if value.is_empty() {
            spec.default.unwrap_or_default().to_string()
        } else {
            value
        }
    }

    /// Commit `value` for `name` and reset to page 1.
    ///
    /// Returns `false` without writing when the trimmed value is unchanged.
    pub fn set(&self, name: &str, value: &str) -> bool {
        let next = value.trim();
        if self.value(name) == next {
            return false;
        }
        let patch = StorePatch::new()
            .set_or_remove(name, next)
            .merge(self.pagination.reset_patch());
        self.store.commit(patch);
        info!(filter = name, value = next, "filter committed");
        true
    }

    /// Remove the filter; returns `false` when it was already absent.
    pub fn clear(&self, name: &str) -> bool {
        self.set(name, "")
    }

    /// Non-empty effective values in declared order, for cache keys and requests.
    #[must_use]
    pub fn committed(&self, specs: &[FilterSpec]) -> Vec<(String, String)> {
        specs
            .iter()
            .map(|spec| (spec.name.to_string(), self.effective(spec)))
            .filter(|(_, value)| !value.is_empty())
            .collect()
    }
}

/// Debounce phase for one free-text filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebouncePhase {
    /// Draft matches what was last committed; nothing scheduled.
    Idle,
    /// A commit is scheduled for `due_at_ms`.
    PendingCommit {
        /// When the pending draft becomes eligible for commit.
        due_at_ms: u64,
    },
    /// The last scheduled commit wrote a new value.
    Committed,
}

/// Draft/committed pair for a debounced filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebouncedFilter {
    name: &'static str,
    delay_ms: u64,
    draft: String,
    phase: DebouncePhase,
}

impl DebouncedFilter {
    /// Start with the draft equal to the committed value.
    #[must_use]
    pub fn new(name: &'static str, delay_ms: u64, filters: &Filters) -> Self {
        Self {
            name,
            delay_ms,
            draft: filters.value(name),
            phase: DebouncePhase::Idle,
        }
    }

    /// Filter name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// In-progress text, untrimmed.
    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> DebouncePhase {
        self.phase
    }

    /// When the pending commit is due, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<u64> {
        match self.phase {
            DebouncePhase::PendingCommit { due_at_ms } => Some(due_at_ms),
            DebouncePhase::Idle | DebouncePhase::Committed => None,
        }
    }

    /// Record an edit; any earlier pending commit is replaced. Returns the new deadline.
    pub fn set_draft(&mut self, draft: impl Into<String>, now_ms: u64) -> u64 {
        self.draft = draft.into();
        let due_at_ms = now_ms.saturating_add(self.delay_ms);
        self.phase = DebouncePhase::PendingCommit { due_at_ms };
        due_at_ms
    }

    /// Fire the pending commit when due. Returns the committed value when a write happened.
    pub fn poll(&mut self, now_ms: u64, filters: &Filters) -> Option<String> {
        let due_at_ms = self.deadline()?;
        if now_ms < due_at_ms {
            return None;
        }
        let next = self.draft.trim().to_string();
        if filters.set(self.name, &next) {
            self.phase = DebouncePhase::Committed;
            Some(next)
        } else {
            debug!(filter = self.name, "debounced draft matches committed value");
            self.phase = DebouncePhase::Idle;
            None
        }
    }

    /// Clear draft and committed value immediately, cancelling any pending commit.
    pub fn clear(&mut self, filters: &Filters) {
        self.draft.clear();
        self.phase = DebouncePhase::Idle;
        filters.clear(self.name);
    }

    /// Adopt the committed value after an external navigation, unless an edit is pending.
    pub fn sync_from(&mut self, filters: &Filters) {
        if self.deadline().is_none() {
            self.draft = filters.value(self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DebouncePhase, DebouncedFilter, FilterSpec, Filters};
    use crate::core::store::{KeyValueStore, MemoryStore};
    use crate::features::lists::pagination::Pagination;
    use std::rc::Rc;

    fn filters(store: &MemoryStore) -> Filters {
        let shared: crate::core::store::SharedStore = Rc::new(store.clone());
        Filters::new(shared.clone(), Pagination::new(shared))
    }

    #[test]
    fn set_resets_page_and_keeps_page_size() {
        let store = MemoryStore::with_entries([("page", "4"), ("pageSize", "25")]);
        let filters = filters(&store);
        assert!(filters.set("category", " rings "));
        assert_eq!(store.get("category").as_deref(), Some("rings"));
        assert_eq!(store.get("page").as_deref(), Some("1"));
        assert_eq!(store.get("pageSize").as_deref(), Some("25"));
        assert_eq!(store.commit_count(), 1);
        assert!(!filters.set("category", "rings"));
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn clearing_removes_the_key() {
        let store = MemoryStore::with_entries([("search", "ana")]);
        let filters = filters(&store);
        assert!(filters.clear("search"));
        assert_eq!(store.get("search"), None);
        assert_eq!(filters.value("search"), "");
        assert!(!filters.clear("search"));
    }

    #[test]
    fn committed_applies_defaults_and_skips_empty() {
        let store = MemoryStore::with_entries([("condition", "New"), ("searchBy", "  ")]);
        let filters = filters(&store);
        let specs = [
            FilterSpec::search("searchBy"),
            FilterSpec::select("category"),
            FilterSpec::select("condition"),
            FilterSpec::select("scope").with_default("all"),
        ];
        assert_eq!(
            filters.committed(&specs),
            vec![
                ("condition".to_string(), "New".to_string()),
                ("scope".to_string(), "all".to_string()),
            ]
        );
    }

    #[test]
    fn rapid_edits_commit_once_with_last_value() {
        let store = MemoryStore::with_entries([("search", "foo"), ("page", "3")]);
        let filters = filters(&store);
        let mut search = DebouncedFilter::new("search", 350, &filters);
        assert_eq!(search.draft(), "foo");

        for (at, text) in [(0, "f"), (100, "fo"), (200, "foo"), (300, "food")] {
            search.set_draft(text, at);
            assert_eq!(search.poll(at + 50, &filters), None);
        }
        assert_eq!(search.poll(400, &filters), None);
        assert_eq!(search.poll(649, &filters), None);
        assert_eq!(store.commit_count(), 0);

        assert_eq!(search.poll(650, &filters).as_deref(), Some("food"));
        assert_eq!(search.phase(), DebouncePhase::Committed);
        assert_eq!(store.get("search").as_deref(), Some("food"));
        assert_eq!(store.get("page").as_deref(), Some("1"));
        assert_eq!(store.commit_count(), 1);

        assert_eq!(search.poll(5_000, &filters), None);
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn returning_to_committed_text_does_not_write() {
        let store = MemoryStore::with_entries([("search", "foo")]);
        let filters = filters(&store);
        let mut search = DebouncedFilter::new("search", 350, &filters);
        search.set_draft("fo", 0);
        search.set_draft(" foo ", 10);
        assert_eq!(search.poll(360, &filters), None);
        assert_eq!(search.phase(), DebouncePhase::Idle);
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn clear_cancels_pending_commit() {
        let store = MemoryStore::with_entries([("search", "foo")]);
        let filters = filters(&store);
        let mut search = DebouncedFilter::new("search", 350, &filters);
        search.set_draft("bar", 0);
        search.clear(&filters);
        assert_eq!(search.deadline(), None);
        assert_eq!(search.draft(), "");
        assert_eq!(store.get("search"), None);
        assert_eq!(search.poll(1_000, &filters), None);
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn sync_adopts_external_changes_only_when_idle() {
        let store = MemoryStore::new();
        let filters = filters(&store);
        let mut search = DebouncedFilter::new("search", 350, &filters);
        filters.set("search", "external");
        search.sync_from(&filters);
        assert_eq!(search.draft(), "external");
        search.set_draft("typing", 0);
        filters.set("search", "other");
        search.sync_from(&filters);
        assert_eq!(search.draft(), "typing");
    }
}
