//! Shop engine: forum HTTP workflow and effect execution.
mod client;
mod decode;
mod engine;
mod forum_page;
mod types;

pub use client::{ClientSettings, ForumClient, ReqwestForumClient};
pub use decode::{decode_page, DecodeError, DecodedPage};
pub use engine::{ChannelEventSink, EngineError, EngineHandle, EventSink};
pub use forum_page::{detect_forum_errors, parse_forum_form};
pub use types::{EngineEvent, FailureKind, FetchError, PageForm, RequestId, SubmitReceipt};
