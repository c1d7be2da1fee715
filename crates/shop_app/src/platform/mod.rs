mod app;
pub mod cli;
mod clock;
mod effects;
mod logging;
mod persistence;
mod scheduler;
mod snapshot;
mod status;

pub use app::run_app;
