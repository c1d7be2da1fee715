use std::fmt;

/// Invalid shop configuration. Never retried; updates stay a no-op until fixed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("shop template is empty")]
    EmptyTemplate,
    #[error("shop template has no [items] placeholder")]
    MissingItemsPlaceholder,
    #[error("shop thread id is not set")]
    MissingThread,
    #[error("invalid shop thread id {0:?}")]
    InvalidThread(String),
    #[error("rendered shop is {len} characters, the forum accepts at most {max}")]
    TooLong { len: usize, max: usize },
    #[error("invalid forum endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Why a page fetch or form submission did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowFailure {
    /// Transport level failure: DNS, connect, timeout, body read.
    Network(String),
    HttpStatus(u16),
    /// The fetched page carried no anti-forgery token.
    TokenMissing,
    /// The forum answered the submission with an error list, typically a stale token.
    Rejected(String),
}

impl WorkflowFailure {
    pub fn is_stale_token(&self) -> bool {
        matches!(self, WorkflowFailure::Rejected(_))
    }
}

impl fmt::Display for WorkflowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowFailure::Network(message) => write!(f, "network error: {message}"),
            WorkflowFailure::HttpStatus(code) => write!(f, "http status {code}"),
            WorkflowFailure::TokenMissing => write!(f, "forum page has no form token"),
            WorkflowFailure::Rejected(message) => write!(f, "forum rejected submission: {message}"),
        }
    }
}
