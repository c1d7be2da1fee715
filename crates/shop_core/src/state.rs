use std::collections::VecDeque;
use std::time::Duration;

use crate::render::render;
use crate::view_model::{ShopViewModel, WorkflowPhase};
use crate::{
    ConfigError, Fingerprint, ForumEndpoints, ItemSnapshot, RequestId, ShopListing, ShopTemplate,
    ThreadId, Timestamp, Track, DEFAULT_MIN_BUMP_INTERVAL,
};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Fixed parameters of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub endpoints: ForumEndpoints,
    pub min_bump_interval: Duration,
    /// Period of the auto-update/auto-bump trigger.
    pub tick_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            endpoints: ForumEndpoints::default(),
            min_bump_interval: DEFAULT_MIN_BUMP_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EditPhase {
    Idle,
    Pending {
        request: RequestId,
    },
    Submitting {
        request: RequestId,
        fingerprint: Fingerprint,
        /// The submission consumed an explicit expiry.
        forced: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BumpPhase {
    Idle,
    Pending { request: RequestId },
    Submitting { request: RequestId },
}

/// Reconfiguration received while a workflow was in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reconfigure {
    Thread(ThreadId),
    Template(ShopTemplate),
}

/// Which workflow step an incoming completion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    EditFetch,
    EditSubmit,
    BumpFetch,
    BumpSubmit,
}

/// Session state for one shop thread. Mutated only through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopState {
    endpoints: ForumEndpoints,
    tick_interval: Duration,
    snapshot: ItemSnapshot,
    listing: ShopListing,
    auto_bump: bool,
    thread_error: Option<ConfigError>,
    template_error: Option<ConfigError>,
    render_error: Option<ConfigError>,
    edit: EditPhase,
    bump: BumpPhase,
    deferred: VecDeque<Track>,
    staged: Vec<Reconfigure>,
    next_request: RequestId,
    timer_armed: bool,
    dirty: bool,
}

impl Default for ShopState {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

impl ShopState {
    pub fn new(settings: SessionSettings) -> Self {
        let mut state = Self {
            endpoints: settings.endpoints,
            tick_interval: settings.tick_interval,
            snapshot: ItemSnapshot::default(),
            listing: ShopListing::new(settings.min_bump_interval),
            auto_bump: false,
            thread_error: None,
            template_error: None,
            render_error: None,
            edit: EditPhase::Idle,
            bump: BumpPhase::Idle,
            deferred: VecDeque::new(),
            staged: Vec::new(),
            next_request: 0,
            timer_armed: false,
            dirty: false,
        };
        state.refresh();
        state.dirty = false;
        state
    }

    pub fn view(&self) -> ShopViewModel {
        ShopViewModel {
            thread: self.listing.thread_id().map(|id| id.to_string()),
            shop_data: self.listing.rendered_text().to_string(),
            fingerprint: self.listing.fingerprint().to_string(),
            submitted_fingerprint: self.listing.submitted_fingerprint().map(|f| f.to_string()),
            stale: self.listing.is_stale(),
            auto_update: self.listing.auto_update(),
            auto_bump: self.auto_bump,
            edit: self.edit_view(),
            bump: self.bump_view(),
            last_bump_time: self.listing.last_bump_time(),
            next_bump_at: self.listing.bump_schedule().next_eligible_at(),
            listed_items: self.snapshot.listed_count(),
            config_error: self.blocking_config_error().or_else(|| self.render_error.clone()),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn thread(&self) -> Option<&ThreadId> {
        self.listing.thread_id()
    }

    pub fn shop_data(&self) -> &str {
        self.listing.rendered_text()
    }

    pub fn shop_template(&self) -> &ShopTemplate {
        self.listing.template()
    }

    pub fn auto_update(&self) -> bool {
        self.listing.auto_update()
    }

    pub fn auto_bump(&self) -> bool {
        self.auto_bump
    }

    pub fn listing(&self) -> &ShopListing {
        &self.listing
    }

    pub fn endpoints(&self) -> &ForumEndpoints {
        &self.endpoints
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// No workflow in flight and nothing waiting to run.
    pub fn is_idle(&self) -> bool {
        !self.is_busy() && self.deferred.is_empty()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.edit != EditPhase::Idle || self.bump != BumpPhase::Idle
    }

    pub(crate) fn edit_in_flight(&self) -> bool {
        self.edit != EditPhase::Idle
    }

    pub(crate) fn edit_is_pending(&self) -> bool {
        matches!(self.edit, EditPhase::Pending { .. })
    }

    pub(crate) fn bump_in_flight(&self) -> bool {
        self.bump != BumpPhase::Idle
    }

    /// Errors that block an edit: thread or template problems.
    pub(crate) fn blocking_config_error(&self) -> Option<ConfigError> {
        self.thread_config_error()
            .or_else(|| self.template_error.clone())
    }

    /// Errors that block a bump; the template does not matter there.
    pub(crate) fn thread_config_error(&self) -> Option<ConfigError> {
        if let Some(err) = &self.thread_error {
            return Some(err.clone());
        }
        if self.listing.thread_id().is_none() {
            return Some(ConfigError::MissingThread);
        }
        None
    }

    pub(crate) fn render_error(&self) -> Option<&ConfigError> {
        self.render_error.as_ref()
    }

    pub(crate) fn set_snapshot(&mut self, snapshot: ItemSnapshot) {
        if self.snapshot != snapshot {
            self.snapshot = snapshot;
            self.mark_dirty();
        }
        self.refresh();
    }

    /// Re-renders the shop text from the current snapshot and template.
    pub(crate) fn refresh(&mut self) {
        match render(&self.snapshot, self.listing.template()) {
            Ok(text) => {
                if text != self.listing.rendered_text() {
                    self.listing.set_rendered(text);
                    self.mark_dirty();
                }
                self.render_error = None;
            }
            Err(err) => {
                if self.render_error.as_ref() != Some(&err) {
                    self.mark_dirty();
                }
                self.render_error = Some(err);
            }
        }
    }

    /// Returns whether the thread actually changed.
    pub(crate) fn apply_thread(&mut self, thread: ThreadId) -> bool {
        self.thread_error = None;
        if self.listing.thread_id() == Some(&thread) {
            return false;
        }
        self.listing.set_thread(thread);
        self.mark_dirty();
        true
    }

    /// Returns whether the template actually changed.
    pub(crate) fn apply_template(&mut self, template: ShopTemplate) -> bool {
        self.template_error = None;
        if self.listing.template() == &template {
            return false;
        }
        self.listing.set_template(template);
        self.refresh();
        self.mark_dirty();
        true
    }

    /// Records an invalid thread. A thread change staged earlier is dropped
    /// since the newest value wins.
    pub(crate) fn reject_thread(&mut self, err: ConfigError) {
        self.staged
            .retain(|change| !matches!(change, Reconfigure::Thread(_)));
        self.thread_error = Some(err);
        self.mark_dirty();
    }

    pub(crate) fn reject_template(&mut self, err: ConfigError) {
        self.staged
            .retain(|change| !matches!(change, Reconfigure::Template(_)));
        self.template_error = Some(err);
        self.mark_dirty();
    }

    pub(crate) fn set_auto_update(&mut self, enabled: bool) {
        if self.listing.auto_update() != enabled {
            self.listing.set_auto_update(enabled);
            self.mark_dirty();
        }
    }

    pub(crate) fn set_auto_bump(&mut self, enabled: bool) {
        if self.auto_bump != enabled {
            self.auto_bump = enabled;
            self.mark_dirty();
        }
    }

    pub(crate) fn timer_wanted(&self) -> bool {
        self.listing.auto_update() || self.auto_bump
    }

    pub(crate) fn timer_armed(&self) -> bool {
        self.timer_armed
    }

    pub(crate) fn set_timer_armed(&mut self, armed: bool) {
        self.timer_armed = armed;
    }

    pub(crate) fn expire(&mut self) {
        if !self.listing.is_expired() {
            self.listing.set_expired(true);
            self.mark_dirty();
        }
    }

    pub(crate) fn is_bump_eligible(&self, now: Timestamp) -> bool {
        self.listing.bump_schedule().is_eligible(now)
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request += 1;
        self.next_request
    }

    /// Resolves a completion to the step it finishes; `None` for unknown or superseded requests.
    pub(crate) fn step_for(&self, request: RequestId) -> Option<Step> {
        match (&self.edit, &self.bump) {
            (EditPhase::Pending { request: r }, _) if *r == request => Some(Step::EditFetch),
            (EditPhase::Submitting { request: r, .. }, _) if *r == request => {
                Some(Step::EditSubmit)
            }
            (_, BumpPhase::Pending { request: r }) if *r == request => Some(Step::BumpFetch),
            (_, BumpPhase::Submitting { request: r }) if *r == request => Some(Step::BumpSubmit),
            _ => None,
        }
    }

    pub(crate) fn begin_edit_fetch(&mut self) -> RequestId {
        let request = self.next_request_id();
        self.edit = EditPhase::Pending { request };
        self.mark_dirty();
        request
    }

    /// Moves to submitting the current rendered text; returns the request id and that text.
    pub(crate) fn begin_edit_submit(&mut self) -> (RequestId, String) {
        let request = self.next_request_id();
        let forced = self.listing.is_expired();
        self.listing.set_expired(false);
        self.edit = EditPhase::Submitting {
            request,
            fingerprint: self.listing.fingerprint().clone(),
            forced,
        };
        self.mark_dirty();
        (request, self.listing.rendered_text().to_string())
    }

    /// Confirms the in-flight submission; returns the new baseline.
    pub(crate) fn finish_edit_success(&mut self) -> Option<Fingerprint> {
        let phase = std::mem::replace(&mut self.edit, EditPhase::Idle);
        self.mark_dirty();
        match phase {
            EditPhase::Submitting { fingerprint, .. } => {
                self.listing.confirm_submitted(fingerprint.clone());
                Some(fingerprint)
            }
            _ => None,
        }
    }

    /// Abandons the edit workflow. The baseline is untouched; an expiry consumed by the
    /// failed submission is restored, and a follow-up update is dropped.
    pub(crate) fn finish_edit_failure(&mut self) {
        let phase = std::mem::replace(&mut self.edit, EditPhase::Idle);
        if let EditPhase::Submitting { forced: true, .. } = phase {
            self.listing.set_expired(true);
        }
        self.deferred.retain(|track| *track != Track::Edit);
        self.mark_dirty();
    }

    pub(crate) fn begin_bump_fetch(&mut self) -> RequestId {
        let request = self.next_request_id();
        self.bump = BumpPhase::Pending { request };
        self.mark_dirty();
        request
    }

    pub(crate) fn begin_bump_submit(&mut self) -> RequestId {
        let request = self.next_request_id();
        self.bump = BumpPhase::Submitting { request };
        self.mark_dirty();
        request
    }

    pub(crate) fn finish_bump(&mut self, bumped_at: Option<Timestamp>) {
        self.bump = BumpPhase::Idle;
        if let Some(now) = bumped_at {
            self.listing.record_bump(now);
        }
        self.mark_dirty();
    }

    pub(crate) fn defer(&mut self, track: Track) {
        if !self.deferred.contains(&track) {
            self.deferred.push_back(track);
            self.mark_dirty();
        }
    }

    pub(crate) fn is_deferred(&self, track: Track) -> bool {
        self.deferred.contains(&track)
    }

    pub(crate) fn pop_deferred(&mut self) -> Option<Track> {
        self.deferred.pop_front()
    }

    /// Holds an already validated change until the workflows settle,
    /// replacing an earlier staged change of the same kind.
    pub(crate) fn stage(&mut self, change: Reconfigure) {
        match &change {
            Reconfigure::Thread(_) => {
                self.thread_error = None;
                self.staged
                    .retain(|staged| !matches!(staged, Reconfigure::Thread(_)));
            }
            Reconfigure::Template(_) => {
                self.template_error = None;
                self.staged
                    .retain(|staged| !matches!(staged, Reconfigure::Template(_)));
            }
        }
        self.staged.push(change);
        self.mark_dirty();
    }

    pub(crate) fn take_staged(&mut self) -> Vec<Reconfigure> {
        std::mem::take(&mut self.staged)
    }

    fn edit_view(&self) -> WorkflowPhase {
        match self.edit {
            EditPhase::Pending { .. } => WorkflowPhase::Pending,
            EditPhase::Submitting { .. } => WorkflowPhase::Submitting,
            EditPhase::Idle if self.is_deferred(Track::Edit) => WorkflowPhase::Deferred,
            EditPhase::Idle => WorkflowPhase::Idle,
        }
    }

    fn bump_view(&self) -> WorkflowPhase {
        match self.bump {
            BumpPhase::Pending { .. } => WorkflowPhase::Pending,
            BumpPhase::Submitting { .. } => WorkflowPhase::Submitting,
            BumpPhase::Idle if self.is_deferred(Track::Bump) => WorkflowPhase::Deferred,
            BumpPhase::Idle => WorkflowPhase::Idle,
        }
    }
}
