use std::time::Duration;

use crate::fingerprint::has_changed;
use crate::{Fingerprint, ShopTemplate, ThreadId, Timestamp};

/// Forum rules allow one bump per hour.
pub const DEFAULT_MIN_BUMP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpSchedule {
    last_bump_time: Option<Timestamp>,
    min_interval: Duration,
}

impl BumpSchedule {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_bump_time: None,
            min_interval,
        }
    }

    pub fn is_eligible(&self, now: Timestamp) -> bool {
        match self.last_bump_time {
            None => true,
            Some(last) => now.since(last) >= self.min_interval,
        }
    }

    pub fn next_eligible_at(&self) -> Option<Timestamp> {
        self.last_bump_time.map(|last| last.add(self.min_interval))
    }

    pub fn last_bump_time(&self) -> Option<Timestamp> {
        self.last_bump_time
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub(crate) fn record(&mut self, now: Timestamp) {
        self.last_bump_time = Some(now);
    }

    pub(crate) fn reset(&mut self) {
        self.last_bump_time = None;
    }
}

/// The shop post as this session knows it.
///
/// `fingerprint` always hashes `rendered_text`. The submitted baseline only
/// moves after the forum confirmed a submission, so staleness is derived from
/// the two rather than stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopListing {
    thread_id: Option<ThreadId>,
    rendered_text: String,
    fingerprint: Fingerprint,
    template: ShopTemplate,
    auto_update: bool,
    bump: BumpSchedule,
    submitted: Option<Fingerprint>,
    expired: bool,
}

impl ShopListing {
    pub(crate) fn new(min_bump_interval: Duration) -> Self {
        Self {
            thread_id: None,
            rendered_text: String::new(),
            fingerprint: Fingerprint::of(""),
            template: ShopTemplate::default(),
            auto_update: false,
            bump: BumpSchedule::new(min_bump_interval),
            submitted: None,
            expired: false,
        }
    }

    pub fn thread_id(&self) -> Option<&ThreadId> {
        self.thread_id.as_ref()
    }

    pub fn rendered_text(&self) -> &str {
        &self.rendered_text
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn submitted_fingerprint(&self) -> Option<&Fingerprint> {
        self.submitted.as_ref()
    }

    pub fn template(&self) -> &ShopTemplate {
        &self.template
    }

    pub fn auto_update(&self) -> bool {
        self.auto_update
    }

    pub fn bump_schedule(&self) -> &BumpSchedule {
        &self.bump
    }

    pub fn last_bump_time(&self) -> Option<Timestamp> {
        self.bump.last_bump_time()
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn is_stale(&self) -> bool {
        self.expired || has_changed(&self.fingerprint, self.submitted.as_ref())
    }

    pub(crate) fn set_rendered(&mut self, text: String) {
        self.fingerprint = Fingerprint::of(&text);
        self.rendered_text = text;
    }

    pub(crate) fn set_thread(&mut self, thread: ThreadId) {
        self.thread_id = Some(thread);
        self.submitted = None;
        self.bump.reset();
    }

    pub(crate) fn set_template(&mut self, template: ShopTemplate) {
        self.template = template;
        self.submitted = None;
    }

    pub(crate) fn set_auto_update(&mut self, enabled: bool) {
        self.auto_update = enabled;
    }

    pub(crate) fn set_expired(&mut self, expired: bool) {
        self.expired = expired;
    }

    pub(crate) fn confirm_submitted(&mut self, fingerprint: Fingerprint) {
        self.submitted = Some(fingerprint);
    }

    pub(crate) fn record_bump(&mut self, now: Timestamp) {
        self.bump.record(now);
    }
}
