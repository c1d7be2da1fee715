use std::sync::Once;
use std::time::Duration;

use shop_core::{
    update, ConfigError, Effect, ForumEndpoints, ForumForm, Item, ItemSnapshot, Msg, Price,
    PriceKind, RequestId, SessionSettings, ShopState, ShopStatus, StatusEvent, Timestamp, Track,
    WorkflowFailure, WorkflowPhase,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(shop_logging::initialize_for_tests);
}

fn t(secs: i64) -> Timestamp {
    Timestamp::from_unix_secs(secs)
}

fn configured() -> ShopState {
    let settings = SessionSettings {
        endpoints: ForumEndpoints {
            base_url: "https://forum.example.com".to_string(),
            ..ForumEndpoints::default()
        },
        min_bump_interval: Duration::from_secs(60),
        tick_interval: Duration::from_secs(300),
    };
    let (state, _) = update(ShopState::new(settings), Msg::SetThread("12345".into()));
    state
}

fn page() -> ForumForm {
    ForumForm {
        token: "tok-2".to_string(),
        title: None,
    }
}

fn fetches(effects: &[Effect]) -> Vec<(RequestId, Track)> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::FetchPage { request, track, .. } => Some((*request, *track)),
            _ => None,
        })
        .collect()
}

fn submit_request(effects: &[Effect]) -> RequestId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::SubmitForm { request, .. } => Some(*request),
            _ => None,
        })
        .expect("submit effect")
}

/// Runs a bump requested at `requested` and confirmed at `confirmed`.
fn bump(state: ShopState, requested: i64, confirmed: i64) -> (ShopState, Vec<Effect>) {
    let (state, effects) = update(state, Msg::BumpRequested { now: t(requested) });
    let Some(&(request, _)) = fetches(&effects).first() else {
        return (state, effects);
    };
    let (state, effects) = update(
        state,
        Msg::PageFetched {
            request,
            result: Ok(page()),
            now: t(requested),
        },
    );
    update(
        state,
        Msg::FormSubmitted {
            request: submit_request(&effects),
            result: Ok(()),
            now: t(confirmed),
        },
    )
}

#[test]
fn bump_fetches_reply_page_and_posts_bump_message() {
    init_logging();
    let (state, effects) = update(configured(), Msg::BumpRequested { now: t(0) });
    assert_eq!(
        effects[0],
        Effect::FetchPage {
            request: 1,
            track: Track::Bump,
            url: "https://forum.example.com/forum/post-reply/12345".to_string(),
            token_field: "hash".to_string(),
        }
    );

    let (state, effects) = update(
        state,
        Msg::PageFetched {
            request: 1,
            result: Ok(page()),
            now: t(0),
        },
    );
    match &effects[0] {
        Effect::SubmitForm {
            track, url, form, ..
        } => {
            assert_eq!(*track, Track::Bump);
            assert_eq!(url, "https://forum.example.com/forum/post-reply/12345");
            assert_eq!(form.get("hash"), Some("tok-2"));
            assert_eq!(
                form.get("content"),
                Some(ForumEndpoints::default().bump_message.as_str())
            );
        }
        other => panic!("expected submit, got {other:?}"),
    }
    assert_eq!(state.view().bump, WorkflowPhase::Submitting);
}

#[test]
fn bump_is_rate_limited_by_min_interval() {
    init_logging();
    let (state, effects) = bump(configured(), 0, 0);
    assert_eq!(
        effects,
        vec![Effect::Status(StatusEvent {
            track: Track::Bump,
            state: ShopStatus::Completed,
            progress: 2,
            total: 2,
        })]
    );
    assert_eq!(state.listing().last_bump_time(), Some(t(0)));

    let (state, effects) = update(state, Msg::BumpRequested { now: t(30) });
    assert!(effects.is_empty());
    assert_eq!(state.view().bump, WorkflowPhase::Idle);

    let (state, effects) = bump(state, 61, 61);
    assert!(matches!(
        &effects[..],
        [Effect::Status(StatusEvent {
            state: ShopStatus::Completed,
            ..
        })]
    ));
    assert_eq!(state.listing().last_bump_time(), Some(t(61)));
}

#[test]
fn second_bump_request_in_flight_is_ignored() {
    init_logging();
    let (state, first) = update(configured(), Msg::BumpRequested { now: t(0) });
    let (_state, second) = update(state, Msg::BumpRequested { now: t(1) });

    assert_eq!(fetches(&first).len(), 1);
    assert!(second.is_empty());
}

#[test]
fn failed_bump_does_not_record_time() {
    init_logging();
    let (state, effects) = update(configured(), Msg::BumpRequested { now: t(0) });
    let (request, _) = fetches(&effects)[0];
    let (state, effects) = update(
        state,
        Msg::PageFetched {
            request,
            result: Err(WorkflowFailure::Network("dns".into())),
            now: t(0),
        },
    );

    assert!(matches!(
        &effects[..],
        [Effect::Status(StatusEvent {
            track: Track::Bump,
            state: ShopStatus::Failed(_),
            ..
        })]
    ));
    assert_eq!(state.listing().last_bump_time(), None);

    let (_state, effects) = update(state, Msg::BumpRequested { now: t(1) });
    assert_eq!(fetches(&effects).len(), 1);
}

#[test]
fn bump_waits_for_in_flight_edit() {
    init_logging();
    let (state, _) = update(
        configured(),
        Msg::SnapshotArrived {
            snapshot: ItemSnapshot::new(vec![
                Item::new("ItemA").with_price(Price::new(PriceKind::Buyout, "1", "chaos")),
            ]),
            now: t(0),
        },
    );
    let (state, effects) = update(state, Msg::UpdateRequested { now: t(0) });
    let (edit_fetch, _) = fetches(&effects)[0];

    let (state, effects) = update(state, Msg::BumpRequested { now: t(1) });
    assert!(effects.is_empty());
    assert_eq!(state.view().bump, WorkflowPhase::Deferred);

    let (state, effects) = update(
        state,
        Msg::PageFetched {
            request: edit_fetch,
            result: Ok(page()),
            now: t(2),
        },
    );
    assert!(fetches(&effects).is_empty());
    let (state, effects) = update(
        state,
        Msg::FormSubmitted {
            request: submit_request(&effects),
            result: Ok(()),
            now: t(3),
        },
    );

    assert!(matches!(
        effects[0],
        Effect::Status(StatusEvent {
            track: Track::Edit,
            state: ShopStatus::Completed,
            ..
        })
    ));
    let bump_fetches = fetches(&effects);
    assert_eq!(bump_fetches.len(), 1);
    assert_eq!(bump_fetches[0].1, Track::Bump);
    assert_eq!(state.view().bump, WorkflowPhase::Pending);
}

#[test]
fn update_waits_for_in_flight_bump() {
    init_logging();
    let (state, effects) = update(configured(), Msg::BumpRequested { now: t(0) });
    let (bump_fetch, _) = fetches(&effects)[0];

    let (state, effects) = update(state, Msg::UpdateRequested { now: t(0) });
    assert!(effects.is_empty());
    assert_eq!(state.view().edit, WorkflowPhase::Deferred);

    let (_state, effects) = update(
        state,
        Msg::PageFetched {
            request: bump_fetch,
            result: Err(WorkflowFailure::HttpStatus(502)),
            now: t(1),
        },
    );
    let follow_up = fetches(&effects);
    assert_eq!(follow_up.len(), 1);
    assert_eq!(follow_up[0].1, Track::Edit);
}

#[test]
fn bump_without_thread_is_configuration_error() {
    init_logging();
    let (_state, effects) = update(ShopState::default(), Msg::BumpRequested { now: t(0) });
    assert_eq!(effects, vec![Effect::ConfigurationError(ConfigError::MissingThread)]);
}

#[test]
fn timer_arms_once_and_drives_auto_bump() {
    init_logging();
    let (state, effects) = update(configured(), Msg::SetAutoBump(true));
    assert_eq!(
        effects,
        vec![Effect::ArmTimer {
            interval: Duration::from_secs(300)
        }]
    );
    let (state, effects) = update(state, Msg::SetAutoUpdate(true));
    assert!(effects.is_empty());

    let (state, _) = update(state, Msg::SetAutoUpdate(false));
    let (state, effects) = update(state, Msg::TimerFired { now: t(100) });
    assert_eq!(fetches(&effects), vec![(1, Track::Bump)]);

    let (_state, effects) = update(state, Msg::SetAutoBump(false));
    assert_eq!(effects, vec![Effect::DisarmTimer]);
}

#[test]
fn timer_without_auto_flags_does_nothing() {
    init_logging();
    let (_state, effects) = update(configured(), Msg::TimerFired { now: t(100) });
    assert!(effects.is_empty());
}
