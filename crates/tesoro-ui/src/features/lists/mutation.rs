//! Optimistic toggle mutations with rollback.
//!
//! # Design
//! - `begin` supersedes in-flight fetches of the resource, then patches one
//!   field of one record before the request is sent.
//! - `settle` either invalidates the resource and the record's detail, or puts
//!   the patched field back. A rollback leaves other records and freshness alone.
//! - Under [`MutationPolicy::Overlap`] concurrent toggles on one record are not
//!   coalesced and the last one to settle decides the cached value.
//! - [`MutationPolicy::SerializePerRecord`] queues later toggles until the
//!   earlier one settles, so they apply in invocation order.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use serde::Deserialize;
use serde_json::{Map, Value};
use tesoro_api_models::ResourceKind;
use tracing::{debug, warn};

use crate::core::error::UiError;
use crate::features::details::key::DetailKey;
use crate::features::lists::cache::{FieldSnapshot, QueryClient};
use crate::features::lists::key::QueryKey;
use crate::features::lists::transport::RecordMutator;

/// Field toggled by block/unblock on users.
pub const BLOCKED_FIELD: &str = "isBlocked";
/// Field toggled by soft-delete/restore.
pub const DELETED_FIELD: &str = "isDeleted";

/// How overlapping mutations on the same record are handled.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MutationPolicy {
    /// Send every toggle immediately.
    #[default]
    Overlap,
    /// Hold later toggles for a record until the earlier one settles.
    SerializePerRecord,
}

/// A boolean field flip on one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleMutation {
    /// Resource owning the record.
    pub resource: ResourceKind,
    /// Record identifier.
    pub record_id: String,
    /// Field being flipped.
    pub field: &'static str,
    /// Value the field should end up with.
    pub value: bool,
}

impl ToggleMutation {
    /// Generic toggle.
    #[must_use]
    pub fn new(
        resource: ResourceKind,
        record_id: impl Into<String>,
        field: &'static str,
        value: bool,
    ) -> Self {
        Self {
            resource,
            record_id: record_id.into(),
            field,
            value,
        }
    }

    /// Block (`true`) or unblock (`false`) a user.
    #[must_use]
    pub fn block_user(user_id: impl Into<String>, blocked: bool) -> Self {
        Self::new(ResourceKind::Users, user_id, BLOCKED_FIELD, blocked)
    }

    /// Soft-delete (`true`) or restore (`false`) a record.
    #[must_use]
    pub fn soft_delete(resource: ResourceKind, record_id: impl Into<String>, deleted: bool) -> Self {
        Self::new(resource, record_id, DELETED_FIELD, deleted)
    }

    /// Partial update body sent to the backend.
    #[must_use]
    pub fn patch(&self) -> Map<String, Value> {
        let mut patch = Map::new();
        patch.insert(self.field.to_string(), Value::Bool(self.value));
        patch
    }
}

/// Handle for one started mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationTicket {
    id: u64,
    key: Option<QueryKey>,
    mutation: ToggleMutation,
    snapshot: Option<FieldSnapshot>,
}

impl MutationTicket {
    /// The toggle being applied.
    #[must_use]
    pub const fn mutation(&self) -> &ToggleMutation {
        &self.mutation
    }

    /// Whether the cache was patched optimistically.
    #[must_use]
    pub const fn is_optimistic(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// Result of [`Mutations::begin`].
#[derive(Clone, Debug, PartialEq)]
pub enum Begin {
    /// The cache is patched; send the request for this ticket.
    Started(MutationTicket),
    /// Another toggle on the record is pending; this one starts when it settles.
    Queued,
}

/// Terminal state of a mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The server accepted the change; cached pages of the resource and the record's detail are stale.
    Committed {
        /// Cached pages marked stale.
        invalidated: usize,
    },
    /// The server rejected the change; the patched field holds its previous value again.
    RolledBack(UiError),
}

/// Result of [`Mutations::settle`].
#[derive(Clone, Debug, PartialEq)]
pub struct Settlement {
    /// What happened to the settled mutation.
    pub outcome: MutationOutcome,
    /// Queued mutation that started as a consequence, if any.
    pub next: Option<MutationTicket>,
}

struct Queued {
    key: Option<QueryKey>,
    mutation: ToggleMutation,
}

/// Mutation controller for one list screen.
pub struct Mutations {
    client: QueryClient,
    policy: MutationPolicy,
    next_id: u64,
    pending: HashMap<u64, String>,
    queued: HashMap<String, VecDeque<Queued>>,
    last_error: Option<UiError>,
}

impl Mutations {
    /// Controller using the client's configured policy.
    #[must_use]
    pub fn new(client: QueryClient) -> Self {
        let policy = client.config().mutation_policy;
        Self::with_policy(client, policy)
    }

    /// Controller with an explicit policy.
    #[must_use]
    pub fn with_policy(client: QueryClient, policy: MutationPolicy) -> Self {
        Self {
            client,
            policy,
            next_id: 0,
            pending: HashMap::new(),
            queued: HashMap::new(),
            last_error: None,
        }
    }

    /// Apply `mutation` optimistically to the page cached under `key`.
    ///
    /// `key` is the active list key; pass `None` when no list is on screen and
    /// only the request should be sent.
    pub fn begin(&mut self, key: Option<&QueryKey>, mutation: ToggleMutation) -> Begin {
        if self.policy == MutationPolicy::SerializePerRecord
            && self.is_record_pending(&mutation.record_id)
        {
            debug!(record_id = %mutation.record_id, "mutation queued behind pending toggle");
            self.queued
                .entry(mutation.record_id.clone())
                .or_default()
                .push_back(Queued {
                    key: key.cloned(),
                    mutation,
                });
            return Begin::Queued;
        }
        Begin::Started(self.start(key.cloned(), mutation))
    }

    /// Resolve a started mutation with the server's answer.
    pub fn settle(&mut self, ticket: MutationTicket, result: Result<(), UiError>) -> Settlement {
        self.pending.remove(&ticket.id);
        let MutationTicket {
            key,
            mutation,
            snapshot,
            ..
        } = ticket;
        let outcome = match result {
            Ok(()) => {
                self.last_error = None;
                let detail = DetailKey::record(mutation.resource, mutation.record_id.as_str());
                let invalidated = self.client.write(|cache| {
                    cache.invalidate_detail(&detail);
                    cache.invalidate_resource(mutation.resource)
                });
                debug!(record_id = %mutation.record_id, invalidated, "mutation committed");
                MutationOutcome::Committed { invalidated }
            }
            Err(error) => {
                if let (Some(key), Some(snapshot)) = (key.as_ref(), snapshot) {
                    self.client.write(|cache| {
                        cache.revert_field(key, &mutation.record_id, mutation.field, snapshot)
                    });
                }
                warn!(record_id = %mutation.record_id, error = %error, "mutation rolled back");
                self.last_error = Some(error.clone());
                MutationOutcome::RolledBack(error)
            }
        };
        let next = self.start_queued(&mutation.record_id);
        Settlement { outcome, next }
    }

    /// Whether any mutation is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Whether a mutation on `record_id` is in flight.
    #[must_use]
    pub fn is_record_pending(&self, record_id: &str) -> bool {
        self.pending.values().any(|id| id == record_id)
    }

    /// Most recent rollback error, cleared by the next commit.
    #[must_use]
    pub const fn last_error(&self) -> Option<&UiError> {
        self.last_error.as_ref()
    }

    fn start(&mut self, key: Option<QueryKey>, mutation: ToggleMutation) -> MutationTicket {
        self.next_id += 1;
        let id = self.next_id;
        let snapshot = self.client.write(|cache| {
            cache.supersede_fetches(mutation.resource);
            key.as_ref().and_then(|key| {
                cache.patch_record(
                    key,
                    &mutation.record_id,
                    mutation.field,
                    Value::Bool(mutation.value),
                )
            })
        });
        self.pending.insert(id, mutation.record_id.clone());
        debug!(
            record_id = %mutation.record_id,
            field = mutation.field,
            value = mutation.value,
            optimistic = snapshot.is_some(),
            "mutation started"
        );
        MutationTicket {
            id,
            key,
            mutation,
            snapshot,
        }
    }

    fn start_queued(&mut self, record_id: &str) -> Option<MutationTicket> {
        let queue = self.queued.get_mut(record_id)?;
        let next = queue.pop_front();
        if queue.is_empty() {
            self.queued.remove(record_id);
        }
        next.map(|queued| self.start(queued.key, queued.mutation))
    }
}

/// Send `ticket` and every mutation it unblocks, returning their outcomes in order.
pub async fn drive_mutation<M>(
    mutations: &RefCell<Mutations>,
    mutator: &M,
    ticket: MutationTicket,
) -> Vec<MutationOutcome>
where
    M: RecordMutator + ?Sized,
{
    let mut outcomes = Vec::new();
    let mut current = Some(ticket);
    while let Some(ticket) = current.take() {
        let toggle = ticket.mutation().clone();
        let result = mutator
            .mutate(toggle.resource, &toggle.record_id, &toggle.patch())
            .await
            .map(|_| ());
        let settlement = mutations.borrow_mut().settle(ticket, result);
        outcomes.push(settlement.outcome);
        current = settlement.next;
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::{Begin, MutationOutcome, MutationPolicy, Mutations, ToggleMutation};
    use crate::core::config::UiConfig;
    use crate::core::error::UiError;
    use crate::features::details::key::DetailKey;
    use crate::features::lists::cache::{Freshness, QueryClient};
    use crate::features::lists::key::QueryKey;
    use crate::features::lists::pagination::PageRequest;
    use crate::features::lists::query::{FetchOutcome, ListQuery};
    use serde_json::json;
    use tesoro_api_models::{ListResult, Record, ResourceKind};

    fn page(page: u32) -> QueryKey {
        QueryKey::new(ResourceKind::Users, PageRequest { page, page_size: 15 })
    }

    fn seeded() -> QueryClient {
        let client = QueryClient::new(UiConfig::default());
        let rows = ListResult {
            items: vec![
                Record::from_value(json!({"id": "u1", "isBlocked": false})).expect("object"),
                Record::from_value(json!({"id": "u2", "isBlocked": false})).expect("object"),
            ],
            total: 2,
        };
        client.write(|cache| {
            cache.store_fetched(page(1), rows.clone(), 0);
            cache.store_fetched(page(2), rows, 0);
        });
        client
    }

    fn blocked(client: &QueryClient, key: &QueryKey, id: &str) -> bool {
        client
            .entry(key)
            .and_then(|entry| entry.result.find(id).map(|r| r.bool_field("isBlocked")))
            .unwrap_or(false)
    }

    fn started(begin: Begin) -> super::MutationTicket {
        match begin {
            Begin::Started(ticket) => ticket,
            Begin::Queued => panic!("expected the mutation to start"),
        }
    }

    #[test]
    fn optimistic_value_is_visible_before_the_request_resolves() {
        let client = seeded();
        let mut mutations = Mutations::new(client.clone());
        let ticket = started(mutations.begin(Some(&page(1)), ToggleMutation::block_user("u1", true)));

        assert!(ticket.is_optimistic());
        assert!(mutations.is_pending());
        assert!(blocked(&client, &page(1), "u1"));
        assert!(!blocked(&client, &page(1), "u2"));
        assert!(!blocked(&client, &page(2), "u1"));

        let settlement = mutations.settle(ticket, Ok(()));
        assert_eq!(settlement.outcome, MutationOutcome::Committed { invalidated: 2 });
        assert!(!mutations.is_pending());
        assert_eq!(client.entry(&page(1)).map(|e| e.freshness), Some(Freshness::Stale));
        assert!(blocked(&client, &page(1), "u1"));
    }

    #[test]
    fn failure_restores_snapshot_and_surfaces_error() {
        let client = seeded();
        let mut mutations = Mutations::new(client.clone());
        let before = client.entry(&page(1));
        let ticket = started(mutations.begin(Some(&page(1)), ToggleMutation::block_user("u1", true)));
        let error = UiError::from_response(400, &json!({"message": "cannot block admins"}));

        let settlement = mutations.settle(ticket, Err(error.clone()));
        assert_eq!(settlement.outcome, MutationOutcome::RolledBack(error.clone()));
        assert!(!blocked(&client, &page(1), "u1"));
        assert_eq!(client.entry(&page(1)), before);
        assert_eq!(mutations.last_error(), Some(&error));
        assert!(!mutations.is_pending());
    }

    #[test]
    fn overlapping_toggles_resolve_last_settled_wins() {
        let client = seeded();
        let mut mutations = Mutations::with_policy(client.clone(), MutationPolicy::Overlap);
        let block = started(mutations.begin(Some(&page(1)), ToggleMutation::block_user("u1", true)));
        let unblock =
            started(mutations.begin(Some(&page(1)), ToggleMutation::block_user("u1", false)));
        assert!(!blocked(&client, &page(1), "u1"));

        mutations.settle(unblock, Ok(()));
        mutations.settle(block, Err(UiError::network("reset")));
        assert!(!blocked(&client, &page(1), "u1"));
    }

    #[test]
    fn overlapping_toggles_on_different_records_roll_back_independently() {
        let client = seeded();
        let mut mutations = Mutations::new(client.clone());
        let second = started(mutations.begin(Some(&page(1)), ToggleMutation::block_user("u2", true)));
        let first = started(mutations.begin(Some(&page(1)), ToggleMutation::block_user("u1", true)));

        mutations.settle(first, Ok(()));
        let settlement = mutations.settle(second, Err(UiError::network("reset")));
        assert!(matches!(settlement.outcome, MutationOutcome::RolledBack(_)));

        assert!(blocked(&client, &page(1), "u1"));
        assert!(!blocked(&client, &page(1), "u2"));
        assert_eq!(client.entry(&page(1)).map(|e| e.freshness), Some(Freshness::Stale));
        assert!(client.read(|cache| cache.needs_fetch(&page(1), 1)));
    }

    #[test]
    fn begin_supersedes_fetches_issued_before_it() {
        let client = seeded();
        let mut query = ListQuery::new(client.clone());
        assert!(query.set_key(page(1), 1).is_none());
        client.invalidate(ResourceKind::Users);
        let background = query.ensure_fresh(2).expect("background refetch");

        let mut mutations = Mutations::new(client.clone());
        let ticket = started(mutations.begin(Some(&page(1)), ToggleMutation::block_user("u1", true)));
        let pre_mutation = ListResult {
            items: vec![Record::from_value(json!({"id": "u1", "isBlocked": false})).expect("object")],
            total: 1,
        };
        assert_eq!(query.complete(background, Ok(pre_mutation), 3), FetchOutcome::Discarded);
        assert!(blocked(&client, &page(1), "u1"));
        assert!(!query.view().is_fetching);

        mutations.settle(ticket, Ok(()));
        assert!(query.ensure_fresh(4).is_some());
    }

    #[test]
    fn rollback_after_a_superseded_refresh_leaves_the_page_refetchable() {
        let client = seeded();
        let mut query = ListQuery::new(client.clone());
        assert!(query.set_key(page(1), 1).is_none());
        client.invalidate(ResourceKind::Users);
        let background = query.ensure_fresh(2).expect("background refetch");
        let mut mutations = Mutations::new(client.clone());
        let ticket = started(mutations.begin(Some(&page(1)), ToggleMutation::block_user("u1", true)));
        query.complete(background, Ok(ListResult::default()), 3);

        mutations.settle(ticket, Err(UiError::network("reset")));
        assert!(!blocked(&client, &page(1), "u1"));
        assert_eq!(client.entry(&page(1)).map(|e| e.freshness), Some(Freshness::Stale));
        assert!(query.ensure_fresh(10_000_000).is_some());
    }

    #[test]
    fn rollback_keeps_a_refresh_that_landed_meanwhile() {
        let client = seeded();
        let mut query = ListQuery::new(client.clone());
        assert!(query.set_key(page(1), 1).is_none());
        let mut mutations = Mutations::new(client.clone());
        let ticket = started(mutations.begin(Some(&page(1)), ToggleMutation::block_user("u1", true)));
        client.invalidate(ResourceKind::Users);
        let refresh = query.ensure_fresh(2).expect("refetch after begin");
        let server = ListResult {
            items: vec![
                Record::from_value(json!({"id": "u1", "isBlocked": true, "name": "Ana"}))
                    .expect("object"),
            ],
            total: 1,
        };
        assert_eq!(query.complete(refresh, Ok(server), 3), FetchOutcome::Applied);

        mutations.settle(ticket, Err(UiError::network("reset")));
        let entry = client.entry(&page(1)).expect("cached");
        assert_eq!(entry.freshness, Freshness::Fresh);
        assert_eq!(entry.result.total, 1);
        let row = entry.result.find("u1").expect("u1");
        assert!(!row.bool_field("isBlocked"));
        assert_eq!(row.str_field("name"), Some("Ana"));
        assert!(query.ensure_fresh(4).is_none());
    }

    #[test]
    fn commit_marks_the_record_detail_stale() {
        let client = seeded();
        let detail = DetailKey::record(ResourceKind::Users, "u1");
        let other = DetailKey::record(ResourceKind::Users, "u2");
        client.write(|cache| {
            cache.store_detail(detail.clone(), json!({"id": "u1"}), 0);
            cache.store_detail(other.clone(), json!({"id": "u2"}), 0);
        });
        let mut mutations = Mutations::new(client.clone());
        let ticket = started(mutations.begin(Some(&page(1)), ToggleMutation::block_user("u1", true)));
        mutations.settle(ticket, Ok(()));
        assert_eq!(client.detail(&detail).map(|e| e.freshness), Some(Freshness::Stale));
        assert_eq!(client.detail(&other).map(|e| e.freshness), Some(Freshness::Fresh));
    }

    #[test]
    fn serialized_policy_queues_per_record() {
        let client = seeded();
        let mut mutations =
            Mutations::with_policy(client.clone(), MutationPolicy::SerializePerRecord);
        let first = started(mutations.begin(Some(&page(1)), ToggleMutation::block_user("u1", true)));
        assert_eq!(
            mutations.begin(Some(&page(1)), ToggleMutation::block_user("u1", false)),
            Begin::Queued
        );
        let other = started(mutations.begin(Some(&page(1)), ToggleMutation::block_user("u2", true)));
        assert!(blocked(&client, &page(1), "u1"));

        let settlement = mutations.settle(first, Ok(()));
        let second = settlement.next.expect("queued toggle starts");
        assert!(!second.mutation().value);
        assert!(!blocked(&client, &page(1), "u1"));
        assert!(mutations.settle(second, Ok(())).next.is_none());
        assert!(mutations.settle(other, Ok(())).next.is_none());
        assert!(!mutations.is_pending());
    }

    #[test]
    fn missing_record_sends_without_patching() {
        let client = seeded();
        let mut mutations = Mutations::new(client.clone());
        let ticket = started(mutations.begin(Some(&page(1)), ToggleMutation::block_user("u9", true)));
        assert!(!ticket.is_optimistic());
        let detached = started(mutations.begin(None, ToggleMutation::block_user("u1", true)));
        assert!(!detached.is_optimistic());
        assert!(!blocked(&client, &page(1), "u1"));
        let patch = ToggleMutation::soft_delete(ResourceKind::Treasures, "t1", true).patch();
        assert_eq!(patch.get("isDeleted"), Some(&json!(true)));
    }
}
