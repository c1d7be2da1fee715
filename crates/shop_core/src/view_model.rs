use crate::{ConfigError, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowPhase {
    #[default]
    Idle,
    /// Waiting for the other workflow to settle.
    Deferred,
    /// Fetching the forum form.
    Pending,
    Submitting,
}

/// Read-only picture of the session for observers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShopViewModel {
    pub thread: Option<String>,
    pub shop_data: String,
    pub fingerprint: String,
    pub submitted_fingerprint: Option<String>,
    pub stale: bool,
    pub auto_update: bool,
    pub auto_bump: bool,
    pub edit: WorkflowPhase,
    pub bump: WorkflowPhase,
    pub last_bump_time: Option<Timestamp>,
    pub next_bump_at: Option<Timestamp>,
    pub listed_items: usize,
    pub config_error: Option<ConfigError>,
    pub dirty: bool,
}
