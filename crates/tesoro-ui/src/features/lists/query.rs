//! List query controller: cache key tracking, placeholder data, stale-response guards.
//!
//! # Design
//! - Every fetch carries a [`FetchTicket`]; a response is applied only when its
//!   ticket is still the latest one issued for the active key and no mutation
//!   of the resource started after it was issued.
//! - While a new key loads, the previous key's data stays visible.
//! - Errors become view state; nothing here returns `Err` to the caller.

use std::cell::RefCell;
use std::time::Duration;

use tesoro_api_models::ListResult;
use tracing::{debug, warn};

use crate::core::clock::Clock;
use crate::core::error::UiError;
use crate::features::lists::cache::QueryClient;
use crate::features::lists::key::QueryKey;
use crate::features::lists::normalize::normalize;
use crate::features::lists::transport::ListFetcher;

/// Handle for one in-flight list fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    id: u64,
    key: QueryKey,
    attempt: u32,
}

impl FetchTicket {
    /// Key the fetch was issued for.
    #[must_use]
    pub const fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Zero-based attempt number.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    fn next_attempt(self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self
        }
    }
}

/// What happened to a completed fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// The result was cached and is now visible.
    Applied,
    /// The ticket was superseded (key changed or a newer fetch was issued).
    Discarded,
    /// A transient failure; fetch again with `ticket` after `delay`.
    Retry {
        /// Ticket for the next attempt.
        ticket: FetchTicket,
        /// Backoff before the next attempt.
        delay: Duration,
    },
    /// Retries are exhausted or the error is not retryable.
    Failed(UiError),
}

/// Render-ready snapshot of the active list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListView {
    /// Rows to render: the active key's data, else the previous key's.
    pub data: Option<ListResult>,
    /// No data has ever loaded for the active key and no error occurred.
    pub is_loading: bool,
    /// A fetch for the active key is in flight.
    pub is_fetching: bool,
    /// `data` belongs to the previous key.
    pub is_placeholder: bool,
    /// The last fetch for the active key failed.
    pub is_error: bool,
    /// Failure detail when `is_error` is set.
    pub error: Option<UiError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct InFlight {
    ticket: u64,
    epoch: u64,
}

/// Controller for one list screen.
pub struct ListQuery {
    client: QueryClient,
    active: Option<QueryKey>,
    placeholder: Option<ListResult>,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    error: Option<UiError>,
}

impl ListQuery {
    /// Controller over the shared cache.
    #[must_use]
    pub const fn new(client: QueryClient) -> Self {
        Self {
            client,
            active: None,
            placeholder: None,
            in_flight: None,
            next_ticket: 0,
            error: None,
        }
    }

    /// Shared cache handle.
    #[must_use]
    pub const fn client(&self) -> &QueryClient {
        &self.client
    }

    /// Key currently on screen.
    #[must_use]
    pub const fn active_key(&self) -> Option<&QueryKey> {
        self.active.as_ref()
    }

    /// Switch to `key`, returning a ticket when a fetch must be issued.
    pub fn set_key(&mut self, key: QueryKey, now_ms: u64) -> Option<FetchTicket> {
        if self.active.as_ref() == Some(&key) {
            return self.ensure_fresh(now_ms);
        }
        if let (Some(previous), Some(_)) = (self.active.as_ref(), self.in_flight) {
            self.client.write(|cache| cache.abort_refresh(previous));
        }
        let cached = self.client.read(|cache| cache.get(&key).is_some());
        self.placeholder = if cached { None } else { self.visible_data() };
        debug!(key = %key, placeholder = self.placeholder.is_some(), "list key changed");
        self.active = Some(key);
        self.in_flight = None;
        self.error = None;
        self.ensure_fresh(now_ms)
    }

    /// Issue a fetch when the active entry is missing or stale and nothing is in flight.
    ///
    /// A failed key is not refetched automatically; call [`Self::refetch`].
    pub fn ensure_fresh(&mut self, now_ms: u64) -> Option<FetchTicket> {
        let key = self.active.clone()?;
        if self.live_ticket().is_some() || self.error.is_some() {
            return None;
        }
        if !self.client.read(|cache| cache.needs_fetch(&key, now_ms)) {
            return None;
        }
        Some(self.issue(key))
    }

    /// Fetch the active key unconditionally, superseding any in-flight fetch.
    pub fn refetch(&mut self) -> Option<FetchTicket> {
        let key = self.active.clone()?;
        self.error = None;
        Some(self.issue(key))
    }

    /// Whether `ticket` is still the latest fetch for the active key and has not
    /// been superseded by a mutation.
    #[must_use]
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.live_ticket() == Some(ticket.id) && self.active.as_ref() == Some(&ticket.key)
    }

    /// Drop a ticket that will not be completed.
    ///
    /// When it was the active key's fetch, the entry falls back to stale so the
    /// next [`Self::ensure_fresh`] refetches.
    pub fn discard(&mut self, ticket: &FetchTicket) -> FetchOutcome {
        if self.in_flight.is_some_and(|in_flight| in_flight.ticket == ticket.id) {
            self.in_flight = None;
            self.client.write(|cache| cache.abort_refresh(&ticket.key));
        }
        warn!(key = %ticket.key, ticket = ticket.id, "discarding superseded list response");
        FetchOutcome::Discarded
    }

    /// Feed a fetch result back into the controller.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<ListResult, UiError>,
        now_ms: u64,
    ) -> FetchOutcome {
        if !self.is_current(&ticket) {
            return self.discard(&ticket);
        }
        match result {
            Ok(list) => {
                self.client
                    .write(|cache| cache.store_fetched(ticket.key.clone(), list, now_ms));
                self.in_flight = None;
                self.error = None;
                self.placeholder = None;
                FetchOutcome::Applied
            }
            Err(error) => {
                let retry = self.client.config().retry.next_delay(ticket.attempt, &error);
                if let Some(delay) = retry {
                    debug!(key = %ticket.key, attempt = ticket.attempt, ?delay, "retrying list fetch");
                    return FetchOutcome::Retry {
                        ticket: ticket.next_attempt(),
                        delay,
                    };
                }
                warn!(key = %ticket.key, error = %error, "list fetch failed");
                self.client.write(|cache| cache.abort_refresh(&ticket.key));
                self.in_flight = None;
                self.placeholder = None;
                self.error = Some(error.clone());
                FetchOutcome::Failed(error)
            }
        }
    }

    /// Snapshot for rendering.
    #[must_use]
    pub fn view(&self) -> ListView {
        let Some(key) = self.active.as_ref() else {
            return ListView::default();
        };
        let cached = self.client.read(|cache| cache.get(key).map(|entry| entry.result.clone()));
        let has_cached = cached.is_some();
        let is_placeholder = !has_cached && self.placeholder.is_some();
        ListView {
            data: cached.or_else(|| self.placeholder.clone()),
            is_loading: !has_cached && self.error.is_none(),
            is_fetching: self.live_ticket().is_some(),
            is_placeholder,
            is_error: self.error.is_some(),
            error: self.error.clone(),
        }
    }

    fn visible_data(&self) -> Option<ListResult> {
        self.active
            .as_ref()
            .and_then(|key| self.client.read(|cache| cache.get(key).map(|e| e.result.clone())))
            .or_else(|| self.placeholder.clone())
    }

    fn live_ticket(&self) -> Option<u64> {
        let in_flight = self.in_flight?;
        let resource = self.active.as_ref()?.resource();
        let epoch = self.client.read(|cache| cache.fetch_epoch(resource));
        (in_flight.epoch == epoch).then_some(in_flight.ticket)
    }

    fn issue(&mut self, key: QueryKey) -> FetchTicket {
        self.next_ticket += 1;
        let id = self.next_ticket;
        let epoch = self.client.write(|cache| {
            cache.begin_refresh(&key);
            cache.fetch_epoch(key.resource())
        });
        self.in_flight = Some(InFlight { ticket: id, epoch });
        debug!(key = %key, ticket = id, epoch, "list fetch issued");
        FetchTicket {
            id,
            key,
            attempt: 0,
        }
    }
}

/// Run `ticket` against `fetcher`, retrying per policy, and apply the result.
pub async fn drive_fetch<F>(
    query: &RefCell<ListQuery>,
    fetcher: &F,
    clock: &dyn Clock,
    ticket: FetchTicket,
) -> FetchOutcome
where
    F: ListFetcher + ?Sized,
{
    let mut ticket = ticket;
    loop {
        let params = ticket.key.to_params();
        let response = fetcher.fetch_list(ticket.key.resource(), &params).await;
        let result = response.map(|raw| normalize(&raw));
        let outcome = query.borrow_mut().complete(ticket, result, clock.now_ms());
        match outcome {
            FetchOutcome::Retry { ticket: next, delay } => {
                clock.sleep(delay).await;
                if !query.borrow().is_current(&next) {
                    return query.borrow_mut().discard(&next);
                }
                ticket = next;
            }
            other => return other,
        }
    }
}
