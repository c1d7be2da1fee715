use shop_logging::{shop_debug, shop_info, shop_warn, shop_workflow};

use crate::effect::StatusEvent;
use crate::state::{Reconfigure, Step};
use crate::{
    Effect, ForumForm, Msg, RequestId, ShopState, ShopTemplate, ThreadId, Timestamp, Track,
    WorkflowFailure,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: ShopState, msg: Msg) -> (ShopState, Vec<Effect>) {
    let mut effects = Vec::new();
    match msg {
        Msg::SnapshotArrived { snapshot, now: _ } => {
            state.set_snapshot(snapshot);
            if state.auto_update() {
                request_update(&mut state, &mut effects);
            }
        }
        Msg::UpdateRequested { now: _ } => request_update(&mut state, &mut effects),
        Msg::BumpRequested { now } => request_bump(&mut state, now, &mut effects),
        Msg::SetAutoUpdate(enabled) => {
            state.set_auto_update(enabled);
            sync_timer(&mut state, &mut effects);
        }
        Msg::SetAutoBump(enabled) => {
            state.set_auto_bump(enabled);
            sync_timer(&mut state, &mut effects);
        }
        Msg::SetShopTemplate(raw) => match ShopTemplate::parse(&raw) {
            Ok(template) => reconfigure(&mut state, Reconfigure::Template(template)),
            Err(err) => {
                shop_warn!("Rejected shop template: {}", err);
                state.reject_template(err.clone());
                effects.push(Effect::ConfigurationError(err));
            }
        },
        Msg::SetThread(raw) => match ThreadId::parse(&raw) {
            Ok(thread) => reconfigure(&mut state, Reconfigure::Thread(thread)),
            Err(err) => {
                shop_warn!("Rejected shop thread: {}", err);
                state.reject_thread(err.clone());
                effects.push(Effect::ConfigurationError(err));
            }
        },
        Msg::ExpireShopData => state.expire(),
        Msg::PageFetched {
            request,
            result,
            now,
        } => on_page_fetched(&mut state, request, result, now, &mut effects),
        Msg::FormSubmitted {
            request,
            result,
            now,
        } => on_form_submitted(&mut state, request, result, now, &mut effects),
        Msg::TimerFired { now } => {
            if state.auto_update() {
                request_update(&mut state, &mut effects);
            }
            if state.auto_bump() {
                request_bump(&mut state, now, &mut effects);
            }
        }
        Msg::NoOp => {}
    }

    (state, effects)
}

fn request_update(state: &mut ShopState, effects: &mut Vec<Effect>) {
    if let Some(err) = state.blocking_config_error() {
        shop_warn!("Shop update skipped: {}", err);
        effects.push(Effect::ConfigurationError(err));
        return;
    }
    if state.edit_is_pending() {
        // Coalesced: the pending fetch submits whatever is rendered when the page arrives.
        state.refresh();
        return;
    }
    if state.edit_in_flight() || state.bump_in_flight() {
        shop_debug!("Shop update deferred until the in-flight workflow settles");
        state.defer(Track::Edit);
        return;
    }

    state.refresh();
    if let Some(err) = state.render_error().cloned() {
        shop_warn!("Shop update skipped: {}", err);
        effects.push(Effect::ConfigurationError(err));
        return;
    }
    if !state.listing().is_stale() {
        shop_debug!(
            "Shop unchanged (fingerprint {}), nothing to submit",
            state.listing().fingerprint().short()
        );
        return;
    }
    let Some(thread) = state.thread().cloned() else {
        return;
    };

    let url = state.endpoints().edit_url(&thread);
    let token_field = state.endpoints().token_field.clone();
    let request = state.begin_edit_fetch();
    shop_workflow!("edit #{} thread={} fetching {}", request, thread, url);
    effects.push(Effect::FetchPage {
        request,
        track: Track::Edit,
        url,
        token_field,
    });
    effects.push(Effect::Status(StatusEvent::submitting(Track::Edit, 0)));
}

fn request_bump(state: &mut ShopState, now: Timestamp, effects: &mut Vec<Effect>) {
    if let Some(err) = state.thread_config_error() {
        shop_warn!("Shop bump skipped: {}", err);
        effects.push(Effect::ConfigurationError(err));
        return;
    }
    if state.bump_in_flight() || state.is_deferred(Track::Bump) {
        shop_debug!("Shop bump already in progress");
        return;
    }
    if !state.is_bump_eligible(now) {
        shop_debug!(
            "Shop bump rate limited until {:?}",
            state.listing().bump_schedule().next_eligible_at()
        );
        return;
    }
    if state.edit_in_flight() {
        shop_debug!("Shop bump deferred until the shop edit settles");
        state.defer(Track::Bump);
        return;
    }
    let Some(thread) = state.thread().cloned() else {
        return;
    };

    let url = state.endpoints().bump_url(&thread);
    let token_field = state.endpoints().token_field.clone();
    let request = state.begin_bump_fetch();
    shop_workflow!("bump #{} thread={} fetching {}", request, thread, url);
    effects.push(Effect::FetchPage {
        request,
        track: Track::Bump,
        url,
        token_field,
    });
    effects.push(Effect::Status(StatusEvent::submitting(Track::Bump, 0)));
}

fn on_page_fetched(
    state: &mut ShopState,
    request: RequestId,
    result: Result<ForumForm, WorkflowFailure>,
    now: Timestamp,
    effects: &mut Vec<Effect>,
) {
    let Some(step) = state.step_for(request) else {
        shop_debug!("Ignoring page for unknown request #{}", request);
        return;
    };
    let thread = state.thread().cloned();
    match (step, result, thread) {
        (Step::EditFetch, Ok(page), Some(thread)) => {
            if let Some(err) = state.render_error().cloned() {
                state.finish_edit_failure();
                effects.push(Effect::Status(StatusEvent::failed(
                    Track::Edit,
                    1,
                    err.to_string(),
                )));
                effects.push(Effect::ConfigurationError(err));
                settle(state, now, effects);
                return;
            }
            let (request, text) = state.begin_edit_submit();
            let url = state.endpoints().edit_url(&thread);
            let form = state.endpoints().edit_form(&page, &text);
            shop_workflow!(
                "edit #{} thread={} submitting {} chars (fingerprint {})",
                request,
                thread,
                text.chars().count(),
                state.listing().fingerprint().short()
            );
            effects.push(Effect::SubmitForm {
                request,
                track: Track::Edit,
                url,
                form,
            });
            effects.push(Effect::Status(StatusEvent::submitting(Track::Edit, 1)));
        }
        (Step::BumpFetch, Ok(page), Some(thread)) => {
            let request = state.begin_bump_submit();
            let url = state.endpoints().bump_url(&thread);
            let form = state.endpoints().bump_form(&page);
            shop_workflow!("bump #{} thread={} submitting", request, thread);
            effects.push(Effect::SubmitForm {
                request,
                track: Track::Bump,
                url,
                form,
            });
            effects.push(Effect::Status(StatusEvent::submitting(Track::Bump, 1)));
        }
        (Step::EditFetch | Step::BumpFetch, Ok(_), None) => {
            let failure = WorkflowFailure::Network("thread id was cleared".to_string());
            fail(state, step, failure, now, effects);
        }
        (Step::EditFetch | Step::BumpFetch, Err(failure), _) => {
            fail(state, step, failure, now, effects);
        }
        (Step::EditSubmit | Step::BumpSubmit, _, _) => {
            shop_warn!("Page completion for submit request #{} ignored", request);
        }
    }
}

fn on_form_submitted(
    state: &mut ShopState,
    request: RequestId,
    result: Result<(), WorkflowFailure>,
    now: Timestamp,
    effects: &mut Vec<Effect>,
) {
    let Some(step) = state.step_for(request) else {
        shop_debug!("Ignoring submission result for unknown request #{}", request);
        return;
    };
    match (step, result) {
        (Step::EditSubmit, Ok(())) => {
            if let Some(baseline) = state.finish_edit_success() {
                shop_info!("Shop submitted, baseline fingerprint {}", baseline.short());
            }
            effects.push(Effect::Status(StatusEvent::completed(Track::Edit)));
            settle(state, now, effects);
        }
        (Step::BumpSubmit, Ok(())) => {
            state.finish_bump(Some(now));
            shop_info!("Shop bumped at {}", now);
            effects.push(Effect::Status(StatusEvent::completed(Track::Bump)));
            settle(state, now, effects);
        }
        (Step::EditSubmit | Step::BumpSubmit, Err(failure)) => {
            fail(state, step, failure, now, effects);
        }
        (Step::EditFetch | Step::BumpFetch, _) => {
            shop_warn!("Submission result for fetch request #{} ignored", request);
        }
    }
}

/// Returns the failed workflow to idle without touching the submitted baseline. Never retries.
fn fail(
    state: &mut ShopState,
    step: Step,
    failure: WorkflowFailure,
    now: Timestamp,
    effects: &mut Vec<Effect>,
) {
    let (track, progress) = match step {
        Step::EditFetch => (Track::Edit, 0),
        Step::EditSubmit => (Track::Edit, 1),
        Step::BumpFetch => (Track::Bump, 0),
        Step::BumpSubmit => (Track::Bump, 1),
    };
    if failure.is_stale_token() {
        shop_warn!(
            "Shop {} rejected ({}); the next attempt fetches a fresh token",
            track,
            failure
        );
    } else {
        shop_warn!("Shop {} failed: {}", track, failure);
    }
    match track {
        Track::Edit => state.finish_edit_failure(),
        Track::Bump => state.finish_bump(None),
    }
    effects.push(Effect::Status(StatusEvent::failed(
        track,
        progress,
        failure.to_string(),
    )));
    settle(state, now, effects);
}

/// Runs once a workflow returned to idle: staged reconfiguration first, then deferred
/// requests in the order they arrived.
fn settle(state: &mut ShopState, now: Timestamp, effects: &mut Vec<Effect>) {
    if state.is_busy() {
        return;
    }
    for change in state.take_staged() {
        apply_reconfigure(state, change);
    }
    while !state.is_busy() {
        let Some(track) = state.pop_deferred() else {
            break;
        };
        match track {
            Track::Edit => request_update(state, effects),
            Track::Bump => request_bump(state, now, effects),
        }
    }
}

/// Applies a validated change now, or stages it while a workflow is in flight.
fn reconfigure(state: &mut ShopState, change: Reconfigure) {
    if state.is_busy() {
        shop_debug!("Staging {:?} until the in-flight workflow settles", change);
        state.stage(change);
        return;
    }
    apply_reconfigure(state, change);
}

fn apply_reconfigure(state: &mut ShopState, change: Reconfigure) {
    let (what, changed) = match change {
        Reconfigure::Thread(thread) => ("thread", state.apply_thread(thread)),
        Reconfigure::Template(template) => ("template", state.apply_template(template)),
    };
    if changed {
        shop_info!("Shop {} changed; the next update resubmits", what);
    }
}

fn sync_timer(state: &mut ShopState, effects: &mut Vec<Effect>) {
    let wanted = state.timer_wanted();
    if wanted == state.timer_armed() {
        return;
    }
    state.set_timer_armed(wanted);
    if wanted {
        effects.push(Effect::ArmTimer {
            interval: state.tick_interval(),
        });
    } else {
        effects.push(Effect::DisarmTimer);
    }
}
