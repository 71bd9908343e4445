//! One resource list screen: URL-backed paging and filters feeding a list query.
//!
//! # Design
//! - The query key is always derived from the store, never cached, so a URL edit
//!   and a UI edit converge on the same key.
//! - Debounced drafts live here; committed values live in the store.
//! - Async helpers only sequence the synchronous controllers and never hold a
//!   `RefCell` borrow across an await.

use std::cell::RefCell;

use tesoro_api_models::ListParams;
use tracing::debug;

use crate::core::clock::Clock;
use crate::core::store::SharedStore;
use crate::features::lists::cache::QueryClient;
use crate::features::lists::filters::{DebouncedFilter, Filters};
use crate::features::lists::key::QueryKey;
use crate::features::lists::mutation::{
    Begin, MutationOutcome, Mutations, ToggleMutation, drive_mutation,
};
use crate::features::lists::pagination::Pagination;
use crate::features::lists::query::{FetchOutcome, FetchTicket, ListQuery, ListView, drive_fetch};
use crate::features::lists::transport::{ListFetcher, RecordMutator};
use crate::features::resources::specs::ListSpec;

/// State for one list page.
pub struct ListScreen {
    spec: ListSpec,
    pagination: Pagination,
    filters: Filters,
    drafts: Vec<DebouncedFilter>,
    query: RefCell<ListQuery>,
    mutations: RefCell<Mutations>,
}

impl ListScreen {
    /// Screen over `store` (normally the URL query string) sharing `client`'s cache.
    #[must_use]
    pub fn new(spec: ListSpec, store: SharedStore, client: QueryClient) -> Self {
        let spec = spec.with_default_page_size(client.config().default_page_size);
        let debounce_ms = client.config().debounce_ms;
        let pagination = Pagination::with_default_page_size(store.clone(), spec.default_page_size);
        let filters = Filters::new(store, pagination.clone());
        let drafts = spec
            .debounced()
            .map(|filter| DebouncedFilter::new(filter.name, debounce_ms, &filters))
            .collect();
        Self {
            spec,
            pagination,
            filters,
            drafts,
            query: RefCell::new(ListQuery::new(client.clone())),
            mutations: RefCell::new(Mutations::new(client)),
        }
    }

    /// Definition this screen was built from.
    #[must_use]
    pub const fn spec(&self) -> &ListSpec {
        &self.spec
    }

    /// Paging controls.
    #[must_use]
    pub const fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Committed filter values.
    #[must_use]
    pub const fn filters(&self) -> &Filters {
        &self.filters
    }

    /// List query controller.
    #[must_use]
    pub const fn query(&self) -> &RefCell<ListQuery> {
        &self.query
    }

    /// Mutation controller.
    #[must_use]
    pub const fn mutations(&self) -> &RefCell<Mutations> {
        &self.mutations
    }

    /// Cache key for the current URL state.
    #[must_use]
    pub fn query_key(&self) -> QueryKey {
        QueryKey::new(self.spec.resource, self.pagination.current())
            .with_filters(self.filters.committed(self.spec.filters))
    }

    /// Request parameters for the current URL state.
    #[must_use]
    pub fn list_params(&self) -> ListParams {
        self.query_key().to_params()
    }

    /// Render snapshot of the active list.
    #[must_use]
    pub fn view(&self) -> ListView {
        self.query.borrow().view()
    }

    /// Push the current key into the query controller; returns a ticket when a fetch is needed.
    pub fn sync(&mut self, now_ms: u64) -> Option<FetchTicket> {
        for draft in &mut self.drafts {
            draft.sync_from(&self.filters);
        }
        let key = self.query_key();
        self.query.borrow_mut().set_key(key, now_ms)
    }

    /// Commit a non-debounced filter immediately. Returns `false` when nothing changed.
    pub fn set_filter(&self, name: &str, value: &str) -> bool {
        self.filters.set(name, value)
    }

    /// Current draft text for a debounced filter.
    #[must_use]
    pub fn draft(&self, name: &str) -> Option<&str> {
        self.drafts
            .iter()
            .find(|draft| draft.name() == name)
            .map(DebouncedFilter::draft)
    }

    /// Record a keystroke in a debounced filter, returning when the commit is due.
    ///
    /// Names without a debounced filter are committed at once and return `None`.
    pub fn edit_draft(&mut self, name: &str, text: &str, now_ms: u64) -> Option<u64> {
        match self.drafts.iter_mut().find(|draft| draft.name() == name) {
            Some(draft) => Some(draft.set_draft(text, now_ms)),
            None => {
                self.filters.set(name, text);
                None
            }
        }
    }

    /// Clear a debounced filter's draft and committed value together.
    pub fn clear_draft(&mut self, name: &str) {
        if let Some(draft) = self.drafts.iter_mut().find(|draft| draft.name() == name) {
            draft.clear(&self.filters);
        }
    }

    /// Earliest pending debounce deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.drafts.iter().filter_map(DebouncedFilter::deadline).min()
    }

    /// Fire due debounced commits; returns `true` when any filter changed.
    pub fn poll_drafts(&mut self, now_ms: u64) -> bool {
        let mut changed = false;
        for draft in &mut self.drafts {
            if let Some(value) = draft.poll(now_ms, &self.filters) {
                debug!(filter = draft.name(), value = %value, "debounced filter committed");
                changed = true;
            }
        }
        changed
    }

    /// Start an optimistic toggle against the active page.
    pub fn toggle(&self, mutation: ToggleMutation) -> Begin {
        let key = self.query.borrow().active_key().cloned();
        self.mutations.borrow_mut().begin(key.as_ref(), mutation)
    }

    /// Block a user.
    pub fn block_user(&self, user_id: &str) -> Begin {
        self.toggle(ToggleMutation::block_user(user_id, true))
    }

    /// Unblock a user.
    pub fn unblock_user(&self, user_id: &str) -> Begin {
        self.toggle(ToggleMutation::block_user(user_id, false))
    }

    /// Soft-delete (`true`) or restore (`false`) a record of this screen's resource.
    pub fn set_deleted(&self, record_id: &str, deleted: bool) -> Begin {
        self.toggle(ToggleMutation::soft_delete(self.spec.resource, record_id, deleted))
    }

    /// Sync and, when needed, fetch the current page to completion.
    pub async fn refresh<F>(&mut self, fetcher: &F, clock: &dyn Clock) -> Option<FetchOutcome>
    where
        F: ListFetcher + ?Sized,
    {
        let ticket = self.sync(clock.now_ms())?;
        Some(drive_fetch(&self.query, fetcher, clock, ticket).await)
    }

    /// Run a toggle and anything it unblocks, then refetch the page if it went stale.
    pub async fn run_toggle<M, F>(
        &self,
        mutation: ToggleMutation,
        mutator: &M,
        fetcher: &F,
        clock: &dyn Clock,
    ) -> Vec<MutationOutcome>
    where
        M: RecordMutator + ?Sized,
        F: ListFetcher + ?Sized,
    {
        let Begin::Started(ticket) = self.toggle(mutation) else {
            return Vec::new();
        };
        let outcomes = drive_mutation(&self.mutations, mutator, ticket).await;
        let refetch = self.query.borrow_mut().ensure_fresh(clock.now_ms());
        if let Some(ticket) = refetch {
            drive_fetch(&self.query, fetcher, clock, ticket).await;
        }
        outcomes
    }
}
