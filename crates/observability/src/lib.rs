//! `ims-observability` — shared tracing/logging setup.

pub mod tracing;

/// Initialize process-wide observability with defaults.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}
