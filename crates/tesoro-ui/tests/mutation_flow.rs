//! Optimistic block/unblock against a scripted backend.

use std::rc::Rc;

use serde_json::json;
use tesoro_api_models::ResourceKind;
use tesoro_test_support::fixtures::{error_body, keyed_page, user, users_page};
use tesoro_test_support::init_test_tracing;
use tesoro_test_support::mocks::{RecordingMutator, ScriptedFetcher};
use tesoro_ui::core::clock::{Clock, ManualClock};
use tesoro_ui::core::error::UiError;
use tesoro_ui::core::store::{MemoryStore, SharedStore};
use tesoro_ui::features::lists::cache::Freshness;
use tesoro_ui::features::lists::mutation::{
    Begin, MutationOutcome, MutationPolicy, ToggleMutation, drive_mutation,
};
use tesoro_ui::features::lists::query::{FetchOutcome, drive_fetch};
use tesoro_ui::{ListScreen, ListSpec, QueryClient, UiConfig};

fn users_screen(client: &QueryClient) -> ListScreen {
    let shared: SharedStore = Rc::new(MemoryStore::new());
    ListScreen::new(ListSpec::for_resource(ResourceKind::Users), shared, client.clone())
}

fn blocked(screen: &ListScreen, id: &str) -> Option<bool> {
    screen
        .view()
        .data
        .and_then(|rows| rows.find(id).map(|row| row.bool_field("isBlocked")))
}

#[tokio::test(flavor = "current_thread")]
async fn failed_block_rolls_back_and_surfaces_error() {
    init_test_tracing();
    let client = QueryClient::new(UiConfig::default());
    let fetcher = ScriptedFetcher::new().then_ok(users_page(&["u1", "u2"], 2));
    let mutator = RecordingMutator::new()
        .then_err(UiError::from_response(422, &error_body("Admins cannot be blocked")));
    let clock = ManualClock::starting_at(0);
    let mut screen = users_screen(&client);
    screen.refresh(&fetcher, &clock).await;

    let outcomes = screen
        .run_toggle(ToggleMutation::block_user("u1", true), &mutator, &fetcher, &clock)
        .await;
    assert!(matches!(outcomes.as_slice(), [MutationOutcome::RolledBack(_)]));
    assert_eq!(blocked(&screen, "u1"), Some(false));
    assert_eq!(
        screen.mutations().borrow().last_error().map(UiError::user_message).as_deref(),
        Some("Admins cannot be blocked")
    );
    assert_eq!(fetcher.calls().len(), 1);

    let calls = mutator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "u1");
    assert_eq!(calls[0].patch.get("isBlocked"), Some(&json!(true)));
}

#[tokio::test(flavor = "current_thread")]
async fn successful_block_is_visible_immediately_then_refetched() {
    let client = QueryClient::new(UiConfig::default());
    let fetcher = ScriptedFetcher::new()
        .then_ok(users_page(&["u1", "u2"], 2))
        .then_ok(keyed_page("users", vec![user("u1", true), user("u2", false)], 2));
    let mutator = RecordingMutator::new().then_ok();
    let clock = ManualClock::starting_at(0);
    let mut screen = users_screen(&client);
    screen.refresh(&fetcher, &clock).await;
    let key = screen.query_key();

    let Begin::Started(ticket) = screen.block_user("u1") else {
        panic!("overlap policy starts immediately");
    };
    assert_eq!(blocked(&screen, "u1"), Some(true));
    assert_eq!(blocked(&screen, "u2"), Some(false));

    let outcomes = drive_mutation(screen.mutations(), &mutator, ticket).await;
    assert_eq!(outcomes, vec![MutationOutcome::Committed { invalidated: 1 }]);
    assert_eq!(client.entry(&key).map(|e| e.freshness), Some(Freshness::Stale));

    screen.refresh(&fetcher, &clock).await;
    assert_eq!(fetcher.calls().len(), 2);
    assert_eq!(client.entry(&key).map(|e| e.freshness), Some(Freshness::Fresh));
    assert_eq!(blocked(&screen, "u1"), Some(true));
}

#[tokio::test(flavor = "current_thread")]
async fn serialized_toggles_apply_in_invocation_order() {
    let config = UiConfig {
        mutation_policy: MutationPolicy::SerializePerRecord,
        ..UiConfig::default()
    };
    let client = QueryClient::new(config);
    let fetcher = ScriptedFetcher::new().then_ok(users_page(&["u1"], 1));
    let mutator = RecordingMutator::new();
    let clock = ManualClock::starting_at(0);
    let mut screen = users_screen(&client);
    screen.refresh(&fetcher, &clock).await;

    let Begin::Started(first) = screen.block_user("u1") else {
        panic!("first toggle starts");
    };
    assert_eq!(screen.unblock_user("u1"), Begin::Queued);

    let outcomes = drive_mutation(screen.mutations(), &mutator, first).await;
    assert_eq!(outcomes.len(), 2);
    let sent: Vec<_> = mutator
        .calls()
        .into_iter()
        .map(|call| call.patch.get("isBlocked").cloned())
        .collect();
    assert_eq!(sent, vec![Some(json!(true)), Some(json!(false))]);
    assert_eq!(blocked(&screen, "u1"), Some(false));
    assert!(!screen.mutations().borrow().is_pending());
}

#[tokio::test(flavor = "current_thread")]
async fn failed_toggle_does_not_undo_a_committed_one_on_another_user() {
    let client = QueryClient::new(UiConfig::default());
    let fetcher = ScriptedFetcher::new()
        .then_ok(users_page(&["u1", "u2"], 2))
        .then_ok(keyed_page("users", vec![user("u1", true), user("u2", false)], 2));
    let mutator = RecordingMutator::new()
        .then_ok()
        .then_err(UiError::from_response(500, &error_body("write failed")));
    let clock = ManualClock::starting_at(0);
    let mut screen = users_screen(&client);
    screen.refresh(&fetcher, &clock).await;
    let key = screen.query_key();

    let Begin::Started(second) = screen.block_user("u2") else {
        panic!("overlap policy starts immediately");
    };
    let Begin::Started(first) = screen.block_user("u1") else {
        panic!("overlap policy starts immediately");
    };
    assert_eq!(blocked(&screen, "u1"), Some(true));
    assert_eq!(blocked(&screen, "u2"), Some(true));

    let committed = drive_mutation(screen.mutations(), &mutator, first).await;
    assert_eq!(committed, vec![MutationOutcome::Committed { invalidated: 1 }]);
    let rolled_back = drive_mutation(screen.mutations(), &mutator, second).await;
    assert!(matches!(rolled_back.as_slice(), [MutationOutcome::RolledBack(_)]));

    assert_eq!(blocked(&screen, "u1"), Some(true));
    assert_eq!(blocked(&screen, "u2"), Some(false));
    assert_eq!(client.entry(&key).map(|e| e.freshness), Some(Freshness::Stale));

    assert_eq!(screen.refresh(&fetcher, &clock).await, Some(FetchOutcome::Applied));
    assert_eq!(fetcher.calls().len(), 2);
    assert_eq!(blocked(&screen, "u1"), Some(true));
}

#[tokio::test(flavor = "current_thread")]
async fn background_refetch_issued_before_a_toggle_cannot_overwrite_it() {
    let client = QueryClient::new(UiConfig::default());
    let fetcher = ScriptedFetcher::new()
        .then_ok(users_page(&["u1"], 1))
        .then_ok(users_page(&["u1"], 1))
        .then_ok(keyed_page("users", vec![user("u1", true)], 1));
    let mutator = RecordingMutator::new().then_ok();
    let clock = ManualClock::starting_at(0);
    let mut screen = users_screen(&client);
    screen.refresh(&fetcher, &clock).await;

    client.invalidate(ResourceKind::Users);
    let background = screen.sync(clock.now_ms()).expect("background refetch");
    let Begin::Started(ticket) = screen.block_user("u1") else {
        panic!("overlap policy starts immediately");
    };

    let landed = drive_fetch(screen.query(), &fetcher, &clock, background).await;
    assert_eq!(landed, FetchOutcome::Discarded);
    assert_eq!(blocked(&screen, "u1"), Some(true));
    assert!(!screen.view().is_fetching);

    drive_mutation(screen.mutations(), &mutator, ticket).await;
    assert_eq!(screen.refresh(&fetcher, &clock).await, Some(FetchOutcome::Applied));
    assert_eq!(fetcher.calls().len(), 3);
    assert_eq!(blocked(&screen, "u1"), Some(true));
}

#[tokio::test(flavor = "current_thread")]
async fn rollback_after_a_discarded_refresh_refetches_on_next_sync() {
    let client = QueryClient::new(UiConfig::default());
    let fetcher = ScriptedFetcher::new()
        .then_ok(users_page(&["u1"], 1))
        .then_ok(users_page(&["u1"], 1))
        .then_ok(users_page(&["u1"], 1));
    let mutator =
        RecordingMutator::new().then_err(UiError::from_response(500, &error_body("write failed")));
    let clock = ManualClock::starting_at(0);
    let mut screen = users_screen(&client);
    screen.refresh(&fetcher, &clock).await;
    let key = screen.query_key();

    client.invalidate(ResourceKind::Users);
    let background = screen.sync(clock.now_ms()).expect("background refetch");
    let Begin::Started(ticket) = screen.block_user("u1") else {
        panic!("overlap policy starts immediately");
    };
    drive_fetch(screen.query(), &fetcher, &clock, background).await;
    let outcomes = drive_mutation(screen.mutations(), &mutator, ticket).await;
    assert!(matches!(outcomes.as_slice(), [MutationOutcome::RolledBack(_)]));
    assert_eq!(blocked(&screen, "u1"), Some(false));
    assert_eq!(client.entry(&key).map(|e| e.freshness), Some(Freshness::Stale));

    clock.advance(10_000_000);
    assert_eq!(screen.refresh(&fetcher, &clock).await, Some(FetchOutcome::Applied));
    assert_eq!(client.entry(&key).map(|e| e.freshness), Some(Freshness::Fresh));
}
