//! Process-wide logging setup shared by the binary and integration tests.

pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize tracing with the format chosen by `LOG_FORMAT` (default JSON).
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
