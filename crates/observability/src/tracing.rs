//! Subscriber construction.
//!
//! `RUST_LOG` wins over the caller's default. `LABELDESK_LOG_FORMAT=pretty`
//! swaps JSON lines for human-readable output on a terminal.

use tracing_subscriber::EnvFilter;

pub const FORMAT_VAR: &str = "LABELDESK_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::parse(std::env::var(FORMAT_VAR).ok().as_deref())
    }

    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

pub fn filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

pub fn init(default_directive: &str) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(default_directive))
        .with_target(false)
        .with_writer(std::io::stderr);

    // try_init fails when a subscriber is already installed; that is fine.
    let _ = match LogFormat::from_env() {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}
