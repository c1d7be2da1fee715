//! Shop core: pure shop rendering, change detection and the forum sync state machine.
mod effect;
mod error;
mod fingerprint;
mod forum;
mod item;
mod listing;
mod msg;
mod render;
mod state;
mod template;
mod types;
mod update;
mod view_model;

pub use effect::{Effect, ShopStatus, StatusEvent};
pub use error::{ConfigError, WorkflowFailure};
pub use fingerprint::{has_changed, Fingerprint};
pub use forum::{ForumEndpoints, ForumForm, FormPayload, ThreadId, THREAD_PLACEHOLDER};
pub use item::{Item, ItemLocation, ItemSnapshot, Price, PriceKind};
pub use listing::{BumpSchedule, ShopListing, DEFAULT_MIN_BUMP_INTERVAL};
pub use msg::Msg;
pub use render::{escape_attr, escape_text, render, MAX_POST_LEN};
pub use state::{SessionSettings, ShopState, DEFAULT_TICK_INTERVAL};
pub use template::{ShopTemplate, COUNT_PLACEHOLDER, DEFAULT_TEMPLATE, ITEMS_PLACEHOLDER};
pub use types::{RequestId, Timestamp, Track};
pub use update::update;
pub use view_model::{ShopViewModel, WorkflowPhase};
