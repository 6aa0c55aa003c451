//! Process-wide log setup for the console binaries.

/// Install the JSON subscriber with the default `info` filter.
///
/// Repeated calls are no-ops.
pub fn init() {
    tracing::init(DEFAULT_DIRECTIVE);
}

/// Filter used when `RUST_LOG` is unset or unparseable.
pub const DEFAULT_DIRECTIVE: &str = "info";

pub mod tracing;
