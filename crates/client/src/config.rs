//! Client configuration.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prefix joined with every relative request path.
    pub base_url: String,
    /// Per-attempt timeout; expiry counts as a transient failure.
    pub timeout: Duration,
    /// Extra attempts after the first one for network failures and timeouts.
    pub retries: u32,
    /// Fixed pause between attempts.
    pub retry_delay: Duration,
    /// Where a 401 sends the user.
    pub login_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid value for {var}: '{value}' is not an integer in range")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read overrides from `LABELDESK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as `from_env`, with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("LABELDESK_API_URL").filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(ms) = parse_var(&lookup, "LABELDESK_TIMEOUT_MS")? {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(n) = parse_var(&lookup, "LABELDESK_RETRIES")? {
            config.retries = u32::try_from(n).map_err(|_| ConfigError {
                var: "LABELDESK_RETRIES",
                value: n.to_string(),
            })?;
        }
        if let Some(ms) = parse_var(&lookup, "LABELDESK_RETRY_DELAY_MS")? {
            config.retry_delay = Duration::from_millis(ms);
        }
        Ok(config)
    }

    /// Join a request path onto `base_url`; absolute URLs pass through.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_var<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError { var, value }),
    }
}
