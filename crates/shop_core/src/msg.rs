use crate::{ForumForm, ItemSnapshot, RequestId, Timestamp, WorkflowFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Item-aggregation refresh delivered a new snapshot.
    SnapshotArrived {
        snapshot: ItemSnapshot,
        now: Timestamp,
    },
    /// Explicit "submit now", or an automatic update trigger.
    UpdateRequested { now: Timestamp },
    /// Explicit "bump now".
    BumpRequested { now: Timestamp },
    SetAutoUpdate(bool),
    /// Bump automatically on timer ticks once eligible.
    SetAutoBump(bool),
    SetShopTemplate(String),
    SetThread(String),
    /// Force the next update to submit even if nothing changed.
    ExpireShopData,
    /// Forum form page arrived (or failed) for an outstanding fetch.
    PageFetched {
        request: RequestId,
        result: Result<ForumForm, WorkflowFailure>,
        now: Timestamp,
    },
    /// Forum answered (or failed) an outstanding form submission.
    FormSubmitted {
        request: RequestId,
        result: Result<(), WorkflowFailure>,
        now: Timestamp,
    },
    /// Periodic trigger from the session timer.
    TimerFired { now: Timestamp },
    /// Fallback for placeholder wiring.
    NoOp,
}
