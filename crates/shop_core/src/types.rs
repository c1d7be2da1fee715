use std::fmt;
use std::time::Duration;

/// Identifies one outstanding forum request so late completions can be matched or dropped.
pub type RequestId = u64;

/// Wall-clock instant in unix seconds.
///
/// Time only enters the core through messages, which keeps the state machine
/// deterministic under simulated clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_unix_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub const fn as_unix_secs(self) -> i64 {
        self.0
    }

    /// Elapsed time since `earlier`; zero if the clock went backwards.
    pub fn since(self, earlier: Timestamp) -> Duration {
        let secs = self.0.saturating_sub(earlier.0).max(0);
        Duration::from_secs(secs as u64)
    }

    pub fn add(self, duration: Duration) -> Timestamp {
        let secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        Timestamp(self.0.saturating_add(secs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// The two independent forum workflows of a shop thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Track {
    Edit,
    Bump,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::Edit => write!(f, "edit"),
            Track::Bump => write!(f, "bump"),
        }
    }
}
