use std::time::Duration;

use crate::{ConfigError, FormPayload, RequestId, Track};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchPage {
        request: RequestId,
        track: Track,
        url: String,
        token_field: String,
    },
    SubmitForm {
        request: RequestId,
        track: Track,
        url: String,
        form: FormPayload,
    },
    Status(StatusEvent),
    ConfigurationError(ConfigError),
    /// Start the single periodic trigger, replacing any running one.
    ArmTimer { interval: Duration },
    DisarmTimer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopStatus {
    Submitting,
    Completed,
    Failed(String),
}

/// Workflow progress for the status bar. Each workflow has two steps: fetch the form, submit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub track: Track,
    pub state: ShopStatus,
    pub progress: u32,
    pub total: u32,
}

pub(crate) const WORKFLOW_STEPS: u32 = 2;

impl StatusEvent {
    pub(crate) fn submitting(track: Track, progress: u32) -> Self {
        Self {
            track,
            state: ShopStatus::Submitting,
            progress,
            total: WORKFLOW_STEPS,
        }
    }

    pub(crate) fn completed(track: Track) -> Self {
        Self {
            track,
            state: ShopStatus::Completed,
            progress: WORKFLOW_STEPS,
            total: WORKFLOW_STEPS,
        }
    }

    pub(crate) fn failed(track: Track, progress: u32, reason: impl Into<String>) -> Self {
        Self {
            track,
            state: ShopStatus::Failed(reason.into()),
            progress,
            total: WORKFLOW_STEPS,
        }
    }
}
