#![deny(missing_docs)]
//! Shared logging utilities for the shop sync workspace.
//!
//! Every crate logs through the `shop_*` macros so the backend can be swapped
//! in one place. The macros forward to the `log` facade; the binary decides
//! where records end up.

/// Log target used for records that concern the forum workflow.
pub const WORKFLOW_TARGET: &str = "shop::workflow";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! shop_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! shop_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! shop_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! shop_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! shop_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Logs an info-level record under [`WORKFLOW_TARGET`].
///
/// Used for forum side effects (page fetches, form submissions) so they can be
/// filtered separately from the rest of the output.
#[macro_export]
macro_rules! shop_workflow {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::WORKFLOW_TARGET, $($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
