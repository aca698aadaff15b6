//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Safe to call more than once; only the first call installs the logger.
/// Returns whether this call installed it.
pub fn init() -> bool {
    env_logger::try_init().is_ok()
}

/// Initialize logging for unit and integration tests
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
