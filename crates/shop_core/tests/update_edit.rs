use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use shop_core::{
    render, update, ConfigError, Effect, Fingerprint, ForumEndpoints, ForumForm, Item,
    ItemSnapshot, Msg, Price, PriceKind, RequestId, SessionSettings, ShopState, ShopStatus,
    ShopTemplate, StatusEvent, Timestamp, Track, WorkflowFailure, WorkflowPhase,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(shop_logging::initialize_for_tests);
}

fn t(secs: i64) -> Timestamp {
    Timestamp::from_unix_secs(secs)
}

fn settings() -> SessionSettings {
    SessionSettings {
        endpoints: ForumEndpoints {
            base_url: "https://forum.example.com".to_string(),
            ..ForumEndpoints::default()
        },
        min_bump_interval: Duration::from_secs(60),
        tick_interval: Duration::from_secs(300),
    }
}

fn item(name: &str) -> Item {
    Item::new(name).with_price(Price::new(PriceKind::Buyout, "1", "chaos"))
}

fn snapshot(names: &[&str]) -> ItemSnapshot {
    ItemSnapshot::new(names.iter().map(|name| item(name)).collect())
}

fn configured() -> ShopState {
    let (state, effects) = update(ShopState::new(settings()), Msg::SetThread("12345".into()));
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::SetShopTemplate("[items]".into()));
    assert!(effects.is_empty());
    state
}

fn with_snapshot(state: ShopState, names: &[&str]) -> ShopState {
    let (state, effects) = update(
        state,
        Msg::SnapshotArrived {
            snapshot: snapshot(names),
            now: t(0),
        },
    );
    assert!(effects.is_empty());
    state
}

fn page() -> ForumForm {
    ForumForm {
        token: "tok-1".to_string(),
        title: Some("My shop".to_string()),
    }
}

fn fetch_request(effects: &[Effect]) -> RequestId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::FetchPage { request, .. } => Some(*request),
            _ => None,
        })
        .expect("fetch effect")
}

fn submitted_content(effects: &[Effect]) -> (RequestId, String) {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::SubmitForm { request, form, .. } => {
                Some((*request, form.get("content").unwrap_or_default().to_string()))
            }
            _ => None,
        })
        .expect("submit effect")
}

fn network_calls(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::FetchPage { .. } | Effect::SubmitForm { .. }))
        .count()
}

fn page_fetched(state: ShopState, request: RequestId) -> (ShopState, Vec<Effect>) {
    update(
        state,
        Msg::PageFetched {
            request,
            result: Ok(page()),
            now: t(1),
        },
    )
}

fn submitted(
    state: ShopState,
    request: RequestId,
    result: Result<(), WorkflowFailure>,
) -> (ShopState, Vec<Effect>) {
    update(
        state,
        Msg::FormSubmitted {
            request,
            result,
            now: t(2),
        },
    )
}

/// Drives one edit workflow to a successful end and returns the submitted text.
fn complete_edit(state: ShopState) -> (ShopState, String) {
    let (state, effects) = update(state, Msg::UpdateRequested { now: t(0) });
    let (state, effects) = page_fetched(state, fetch_request(&effects));
    let (request, content) = submitted_content(&effects);
    let (state, _) = submitted(state, request, Ok(()));
    (state, content)
}

#[test]
fn update_fetches_edit_page_then_submits_and_records_baseline() {
    init_logging();
    let state = with_snapshot(configured(), &["ItemA"]);

    let (state, effects) = update(state, Msg::UpdateRequested { now: t(0) });
    let request = fetch_request(&effects);
    assert_eq!(
        effects,
        vec![
            Effect::FetchPage {
                request,
                track: Track::Edit,
                url: "https://forum.example.com/forum/edit-thread/12345".to_string(),
                token_field: "hash".to_string(),
            },
            Effect::Status(StatusEvent {
                track: Track::Edit,
                state: ShopStatus::Submitting,
                progress: 0,
                total: 2,
            }),
        ]
    );
    assert_eq!(state.view().edit, WorkflowPhase::Pending);

    let (state, effects) = page_fetched(state, request);
    let (submit_request, content) = submitted_content(&effects);
    let expected_text = "[spoiler=\"~b/o 1 chaos\"]\nItemA\n[/spoiler]\n";
    assert_eq!(content, expected_text);
    match &effects[0] {
        Effect::SubmitForm { url, form, .. } => {
            assert_eq!(url, "https://forum.example.com/forum/edit-thread/12345");
            assert_eq!(form.get("hash"), Some("tok-1"));
            assert_eq!(form.get("title"), Some("My shop"));
        }
        other => panic!("expected submit, got {other:?}"),
    }
    assert_eq!(state.view().edit, WorkflowPhase::Submitting);
    assert_eq!(state.listing().submitted_fingerprint(), None);

    let (state, effects) = submitted(state, submit_request, Ok(()));
    assert_eq!(
        effects,
        vec![Effect::Status(StatusEvent {
            track: Track::Edit,
            state: ShopStatus::Completed,
            progress: 2,
            total: 2,
        })]
    );
    let rendered = render(&snapshot(&["ItemA"]), &ShopTemplate::parse("[items]").unwrap()).unwrap();
    assert_eq!(
        state.listing().submitted_fingerprint(),
        Some(&Fingerprint::of(&rendered))
    );
    assert!(!state.listing().is_stale());
    assert!(state.is_idle());

    let (_state, effects) = update(state, Msg::UpdateRequested { now: t(10) });
    assert_eq!(network_calls(&effects), 0);
    assert!(effects.is_empty());
}

#[test]
fn changed_snapshot_triggers_a_new_submission() {
    init_logging();
    let (state, _) = complete_edit(with_snapshot(configured(), &["ItemA"]));
    let state = with_snapshot(state, &["ItemA", "ItemB"]);
    assert!(state.listing().is_stale());

    let (_state, content) = complete_edit(state);
    assert!(content.contains("ItemB"));
}

#[test]
fn failed_submit_keeps_baseline_and_next_update_resubmits_same_content() {
    init_logging();
    let (state, first_content) = complete_edit(with_snapshot(configured(), &["ItemA"]));
    let baseline = state.listing().submitted_fingerprint().cloned();
    let state = with_snapshot(state, &["ItemA", "ItemB"]);

    let (state, effects) = update(state, Msg::UpdateRequested { now: t(0) });
    let (state, effects) = page_fetched(state, fetch_request(&effects));
    let (request, attempted) = submitted_content(&effects);
    let (state, effects) = submitted(
        state,
        request,
        Err(WorkflowFailure::Network("connection reset".into())),
    );

    assert_eq!(network_calls(&effects), 0);
    assert!(matches!(
        &effects[..],
        [Effect::Status(StatusEvent {
            track: Track::Edit,
            state: ShopStatus::Failed(_),
            progress: 1,
            ..
        })]
    ));
    assert_eq!(state.listing().submitted_fingerprint().cloned(), baseline);
    assert_ne!(attempted, first_content);
    assert!(state.listing().is_stale());
    assert!(state.is_idle());

    let (_state, retried) = complete_edit(state);
    assert_eq!(retried, attempted);
}

#[test]
fn page_fetch_failure_returns_to_idle_without_retry() {
    init_logging();
    let state = with_snapshot(configured(), &["ItemA"]);
    let (state, effects) = update(state, Msg::UpdateRequested { now: t(0) });
    let request = fetch_request(&effects);

    let (state, effects) = update(
        state,
        Msg::PageFetched {
            request,
            result: Err(WorkflowFailure::HttpStatus(503)),
            now: t(1),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::Status(StatusEvent {
            track: Track::Edit,
            state: ShopStatus::Failed("http status 503".to_string()),
            progress: 0,
            total: 2,
        })]
    );
    assert_eq!(state.view().edit, WorkflowPhase::Idle);
    assert_eq!(state.listing().submitted_fingerprint(), None);
}

#[test]
fn rejected_token_refetches_page_on_next_attempt() {
    init_logging();
    let state = with_snapshot(configured(), &["ItemA"]);
    let (state, effects) = update(state, Msg::UpdateRequested { now: t(0) });
    let (state, effects) = page_fetched(state, fetch_request(&effects));
    let (request, _) = submitted_content(&effects);
    let (state, _) = submitted(
        state,
        request,
        Err(WorkflowFailure::Rejected("Security token expired".into())),
    );

    let (_state, effects) = update(state, Msg::UpdateRequested { now: t(5) });
    assert!(matches!(
        &effects[0],
        Effect::FetchPage {
            track: Track::Edit,
            ..
        }
    ));
}

#[test]
fn expired_data_is_submitted_even_when_unchanged() {
    init_logging();
    let (state, first) = complete_edit(with_snapshot(configured(), &["ItemA"]));
    let (state, effects) = update(state, Msg::UpdateRequested { now: t(3) });
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::ExpireShopData);
    assert!(effects.is_empty());
    assert!(state.listing().is_stale());

    let (state, again) = complete_edit(state);
    assert_eq!(again, first);
    assert!(!state.listing().is_stale());
}

#[test]
fn expiry_survives_a_failed_submission() {
    init_logging();
    let (state, _) = complete_edit(with_snapshot(configured(), &["ItemA"]));
    let (state, _) = update(state, Msg::ExpireShopData);

    let (state, effects) = update(state, Msg::UpdateRequested { now: t(0) });
    let (state, effects) = page_fetched(state, fetch_request(&effects));
    let (request, _) = submitted_content(&effects);
    let (state, _) = submitted(state, request, Err(WorkflowFailure::HttpStatus(500)));

    assert!(state.listing().is_expired());
    let (_state, effects) = update(state, Msg::UpdateRequested { now: t(9) });
    assert_eq!(network_calls(&effects), 1);
}

#[test]
fn update_while_page_is_pending_submits_latest_text() {
    init_logging();
    let state = with_snapshot(configured(), &["ItemA"]);
    let (state, effects) = update(state, Msg::UpdateRequested { now: t(0) });
    let request = fetch_request(&effects);

    let state = with_snapshot(state, &["ItemA", "ItemC"]);
    let (state, effects) = update(state, Msg::UpdateRequested { now: t(0) });
    assert!(effects.is_empty());

    let (state, effects) = page_fetched(state, request);
    let (submit, content) = submitted_content(&effects);
    assert!(content.contains("ItemC"));

    let (state, effects) = submitted(state, submit, Ok(()));
    assert_eq!(network_calls(&effects), 0);
    assert!(!state.listing().is_stale());
}

#[test]
fn update_while_submitting_runs_once_after_completion() {
    init_logging();
    let state = with_snapshot(configured(), &["ItemA"]);
    let (state, effects) = update(state, Msg::UpdateRequested { now: t(0) });
    let (state, effects) = page_fetched(state, fetch_request(&effects));
    let (submit, _) = submitted_content(&effects);

    let state = with_snapshot(state, &["ItemA", "ItemD"]);
    let (state, effects) = update(state, Msg::UpdateRequested { now: t(1) });
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::UpdateRequested { now: t(1) });
    assert!(effects.is_empty());
    assert_eq!(state.view().edit, WorkflowPhase::Submitting);

    let (state, effects) = submitted(state, submit, Ok(()));
    assert_eq!(network_calls(&effects), 1);
    assert!(matches!(
        effects.last(),
        Some(Effect::Status(StatusEvent {
            state: ShopStatus::Submitting,
            progress: 0,
            ..
        }))
    ));
    assert_eq!(state.view().edit, WorkflowPhase::Pending);
}

#[test]
fn follow_up_update_is_dropped_when_submission_fails() {
    init_logging();
    let state = with_snapshot(configured(), &["ItemA"]);
    let (state, effects) = update(state, Msg::UpdateRequested { now: t(0) });
    let (state, effects) = page_fetched(state, fetch_request(&effects));
    let (submit, _) = submitted_content(&effects);
    let (state, _) = update(state, Msg::UpdateRequested { now: t(1) });

    let (state, effects) = submitted(state, submit, Err(WorkflowFailure::TokenMissing));

    assert_eq!(network_calls(&effects), 0);
    assert!(state.is_idle());
}

#[test]
fn auto_update_submits_when_snapshot_arrives() {
    init_logging();
    let (state, _) = update(configured(), Msg::SetAutoUpdate(true));
    let (state, effects) = update(
        state,
        Msg::SnapshotArrived {
            snapshot: snapshot(&["ItemA"]),
            now: t(0),
        },
    );
    assert_eq!(network_calls(&effects), 1);

    let (state, _) = update(state, Msg::SetAutoUpdate(false));
    assert!(!state.auto_update());
}

#[test]
fn missing_thread_is_reported_and_nothing_is_sent() {
    init_logging();
    let (state, effects) = update(ShopState::new(settings()), Msg::UpdateRequested { now: t(0) });

    assert_eq!(effects, vec![Effect::ConfigurationError(ConfigError::MissingThread)]);
    assert!(state.is_idle());
}

#[test]
fn completion_for_unknown_request_is_ignored() {
    init_logging();
    let state = with_snapshot(configured(), &["ItemA"]);
    let (state, _) = update(state, Msg::UpdateRequested { now: t(0) });
    let before = state.clone();

    let (after, effects) = submitted(state, 999, Ok(()));

    assert!(effects.is_empty());
    assert_eq!(after, before);
}
