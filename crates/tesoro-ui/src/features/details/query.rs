//! Detail query controller for one record page or the revenue summary.
//!
//! # Design
//! - Same ticket rules as list queries: only the latest fetch for the active
//!   key lands, and a mutation of the key's resource supersedes earlier fetches.
//! - No placeholder data; switching records shows a loading state.

use std::cell::RefCell;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::clock::Clock;
use crate::core::error::UiError;
use crate::features::details::key::DetailKey;
use crate::features::lists::cache::QueryClient;
use crate::features::lists::transport::DetailFetcher;

/// Handle for one in-flight detail fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailTicket {
    id: u64,
    key: DetailKey,
    attempt: u32,
}

impl DetailTicket {
    /// Key the fetch was issued for.
    #[must_use]
    pub const fn key(&self) -> &DetailKey {
        &self.key
    }

    /// Zero-based attempt number.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// What happened to a completed detail fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum DetailOutcome {
    /// The payload was cached and is now visible.
    Applied,
    /// The ticket was superseded.
    Discarded,
    /// A transient failure; fetch again with `ticket` after `delay`.
    Retry {
        /// Ticket for the next attempt.
        ticket: DetailTicket,
        /// Backoff before the next attempt.
        delay: Duration,
    },
    /// Retries are exhausted or the error is not retryable.
    Failed(UiError),
}

/// Render-ready snapshot of the active detail.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetailView {
    /// Cached payload for the active key.
    pub data: Option<Value>,
    /// Nothing cached yet and no error.
    pub is_loading: bool,
    /// A fetch is in flight.
    pub is_fetching: bool,
    /// The last fetch failed.
    pub is_error: bool,
    /// Failure detail when `is_error` is set.
    pub error: Option<UiError>,
}

#[derive(Clone, Copy, Debug)]
struct InFlight {
    ticket: u64,
    epoch: u64,
}

/// Controller for one detail page.
pub struct DetailQuery {
    client: QueryClient,
    active: Option<DetailKey>,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    error: Option<UiError>,
}

impl DetailQuery {
    /// Controller over the shared cache.
    #[must_use]
    pub const fn new(client: QueryClient) -> Self {
        Self {
            client,
            active: None,
            in_flight: None,
            next_ticket: 0,
            error: None,
        }
    }

    /// Key currently on screen.
    #[must_use]
    pub const fn active_key(&self) -> Option<&DetailKey> {
        self.active.as_ref()
    }

    /// Switch to `key`, returning a ticket when a fetch must be issued.
    pub fn set_key(&mut self, key: DetailKey, now_ms: u64) -> Option<DetailTicket> {
        if self.active.as_ref() == Some(&key) {
            return self.ensure_fresh(now_ms);
        }
        if let (Some(previous), Some(_)) = (self.active.as_ref(), self.in_flight) {
            self.client.write(|cache| cache.abort_detail_refresh(previous));
        }
        debug!(key = %key, "detail key changed");
        self.active = Some(key);
        self.in_flight = None;
        self.error = None;
        self.ensure_fresh(now_ms)
    }

    /// Issue a fetch when the active entry is missing or stale and nothing is in flight.
    pub fn ensure_fresh(&mut self, now_ms: u64) -> Option<DetailTicket> {
        let key = self.active.clone()?;
        if self.live_ticket().is_some() || self.error.is_some() {
            return None;
        }
        if !self.client.read(|cache| cache.detail_needs_fetch(&key, now_ms)) {
            return None;
        }
        Some(self.issue(key))
    }

    /// Fetch the active key unconditionally.
    pub fn refetch(&mut self) -> Option<DetailTicket> {
        let key = self.active.clone()?;
        self.error = None;
        Some(self.issue(key))
    }

    /// Whether `ticket` may still land.
    #[must_use]
    pub fn is_current(&self, ticket: &DetailTicket) -> bool {
        self.live_ticket() == Some(ticket.id) && self.active.as_ref() == Some(&ticket.key)
    }

    /// Drop a ticket that will not be completed.
    pub fn discard(&mut self, ticket: &DetailTicket) -> DetailOutcome {
        if self.in_flight.is_some_and(|in_flight| in_flight.ticket == ticket.id) {
            self.in_flight = None;
            self.client.write(|cache| cache.abort_detail_refresh(&ticket.key));
        }
        warn!(key = %ticket.key, ticket = ticket.id, "discarding superseded detail response");
        DetailOutcome::Discarded
    }

    /// Feed a fetch result back into the controller.
    pub fn complete(
        &mut self,
        ticket: DetailTicket,
        result: Result<Value, UiError>,
        now_ms: u64,
    ) -> DetailOutcome {
        if !self.is_current(&ticket) {
            return self.discard(&ticket);
        }
        match result {
            Ok(value) => {
                self.client
                    .write(|cache| cache.store_detail(ticket.key.clone(), value, now_ms));
                self.in_flight = None;
                self.error = None;
                DetailOutcome::Applied
            }
            Err(error) => {
                if let Some(delay) = self.client.config().retry.next_delay(ticket.attempt, &error) {
                    return DetailOutcome::Retry {
                        ticket: DetailTicket {
                            attempt: ticket.attempt + 1,
                            ..ticket
                        },
                        delay,
                    };
                }
                warn!(key = %ticket.key, error = %error, "detail fetch failed");
                self.client.write(|cache| cache.abort_detail_refresh(&ticket.key));
                self.in_flight = None;
                self.error = Some(error.clone());
                DetailOutcome::Failed(error)
            }
        }
    }

    /// Snapshot for rendering.
    #[must_use]
    pub fn view(&self) -> DetailView {
        let Some(key) = self.active.as_ref() else {
            return DetailView::default();
        };
        let data = self.client.read(|cache| cache.detail(key).map(|entry| entry.value.clone()));
        DetailView {
            is_loading: data.is_none() && self.error.is_none(),
            data,
            is_fetching: self.live_ticket().is_some(),
            is_error: self.error.is_some(),
            error: self.error.clone(),
        }
    }

    fn live_ticket(&self) -> Option<u64> {
        let in_flight = self.in_flight?;
        let resource = self.active.as_ref()?.resource();
        let epoch = self.client.read(|cache| cache.fetch_epoch(resource));
        (in_flight.epoch == epoch).then_some(in_flight.ticket)
    }

    fn issue(&mut self, key: DetailKey) -> DetailTicket {
        self.next_ticket += 1;
        let id = self.next_ticket;
        let epoch = self.client.write(|cache| {
            cache.begin_detail_refresh(&key);
            cache.fetch_epoch(key.resource())
        });
        self.in_flight = Some(InFlight { ticket: id, epoch });
        debug!(key = %key, ticket = id, "detail fetch issued");
        DetailTicket {
            id,
            key,
            attempt: 0,
        }
    }
}

/// Run `ticket` against `fetcher`, retrying per policy, and apply the result.
pub async fn drive_detail<F>(
    query: &RefCell<DetailQuery>,
    fetcher: &F,
    clock: &dyn Clock,
    ticket: DetailTicket,
) -> DetailOutcome
where
    F: DetailFetcher + ?Sized,
{
    let mut ticket = ticket;
    loop {
        let response = fetcher.fetch_detail(&ticket.key).await;
        let result = response.map(|raw| ticket.key.select(raw));
        let outcome = query.borrow_mut().complete(ticket, result, clock.now_ms());
        match outcome {
            DetailOutcome::Retry { ticket: next, delay } => {
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

#[cfg(test)]
mod tests {
    use super::{DetailOutcome, DetailQuery};
    use crate::core::config::UiConfig;
    use crate::core::error::UiError;
    use crate::features::details::key::DetailKey;
    use crate::features::lists::cache::{Freshness, QueryClient};
    use crate::features::lists::mutation::{Begin, Mutations, ToggleMutation};
    use serde_json::json;
    use tesoro_api_models::ResourceKind;

    fn user(id: &str) -> DetailKey {
        DetailKey::record(ResourceKind::Users, id)
    }

    #[test]
    fn loads_then_serves_from_cache() {
        let client = QueryClient::new(UiConfig::default());
        let mut query = DetailQuery::new(client.clone());
        let ticket = query.set_key(user("u1"), 0).expect("fetch");
        assert!(query.view().is_loading);
        assert_eq!(
            query.complete(ticket, Ok(json!({"id": "u1"})), 1),
            DetailOutcome::Applied
        );
        assert_eq!(query.view().data, Some(json!({"id": "u1"})));

        let mut other = DetailQuery::new(client);
        assert!(other.set_key(user("u1"), 2).is_none());
        assert_eq!(other.view().data, Some(json!({"id": "u1"})));
    }

    #[test]
    fn switching_records_discards_the_old_response() {
        let mut query = DetailQuery::new(QueryClient::new(UiConfig::default()));
        let first = query.set_key(user("u1"), 0).expect("fetch");
        let second = query.set_key(user("u2"), 1).expect("fetch");
        assert_eq!(query.complete(first, Ok(json!({"id": "u1"})), 2), DetailOutcome::Discarded);
        assert_eq!(query.complete(second, Ok(json!({"id": "u2"})), 3), DetailOutcome::Applied);
        assert_eq!(query.view().data, Some(json!({"id": "u2"})));
    }

    #[test]
    fn not_found_surfaces_without_retry() {
        let mut query = DetailQuery::new(QueryClient::new(UiConfig::default()));
        let ticket = query.set_key(DetailKey::record(ResourceKind::Treasures, "t1"), 0).expect("fetch");
        let missing = UiError::from_response(404, &json!({"message": "Treasure not found"}));
        assert_eq!(
            query.complete(ticket, Err(missing.clone()), 1),
            DetailOutcome::Failed(missing.clone())
        );
        let view = query.view();
        assert!(view.is_error);
        assert!(!view.is_loading);
        assert_eq!(view.error, Some(missing));
        assert!(query.ensure_fresh(2).is_none());
        assert!(query.refetch().is_some());
    }

    #[test]
    fn toggle_on_the_record_supersedes_and_invalidates_its_detail() {
        let client = QueryClient::new(UiConfig::default());
        let mut query = DetailQuery::new(client.clone());
        let first = query.set_key(user("u1"), 0).expect("fetch");
        query.complete(first, Ok(json!({"id": "u1", "isBlocked": false})), 1);
        client.write(|cache| cache.invalidate_detail(&user("u1")));
        let background = query.ensure_fresh(2).expect("refetch");

        let mut mutations = Mutations::new(client.clone());
        let Begin::Started(ticket) = mutations.begin(None, ToggleMutation::block_user("u1", true))
        else {
            panic!("overlap policy never queues");
        };
        assert_eq!(
            query.complete(background, Ok(json!({"id": "u1", "isBlocked": false})), 3),
            DetailOutcome::Discarded
        );
        mutations.settle(ticket, Ok(()));
        assert_eq!(client.detail(&user("u1")).map(|e| e.freshness), Some(Freshness::Stale));
        let refetch = query.ensure_fresh(4).expect("refetch after commit");
        assert_eq!(
            query.complete(refetch, Ok(json!({"id": "u1", "isBlocked": true})), 5),
            DetailOutcome::Applied
        );
        assert_eq!(query.view().data, Some(json!({"id": "u1", "isBlocked": true})));
    }
}
