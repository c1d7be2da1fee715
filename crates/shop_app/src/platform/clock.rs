use chrono::Utc;
use shop_core::Timestamp;

/// Wall clock time as the core sees it. The core itself never reads a clock.
pub(crate) fn now() -> Timestamp {
    Timestamp::from_unix_secs(Utc::now().timestamp())
}
