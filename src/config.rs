//! Runtime configuration.
//!
//! Defaults are a 10 second connect deadline and a 5 second poll; both
//! can be overridden from the environment without new arguments.

use std::time::Duration;

use tracing::warn;

/// Default deadline for finding and connecting to the peripheral.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default delay between polling cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Environment variable overriding the connect deadline (whole seconds).
pub const CONNECT_TIMEOUT_ENV: &str = "ESS_CONNECT_TIMEOUT_SECS";

/// Environment variable overriding the polling interval (whole seconds).
pub const POLL_INTERVAL_ENV: &str = "ESS_POLL_INTERVAL_SECS";

/// Settings shared by the command-line tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How long to scan for and connect to the peripheral.
    pub connect_timeout: Duration,
    /// Delay between polling cycles.
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl Config {
    /// Defaults, overridden by any valid environment settings.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(secs) = parse_secs(CONNECT_TIMEOUT_ENV, lookup(CONNECT_TIMEOUT_ENV)) {
            config.connect_timeout = secs;
        }
        if let Some(secs) = parse_secs(POLL_INTERVAL_ENV, lookup(POLL_INTERVAL_ENV)) {
            config.poll_interval = secs;
        }

        config
    }

    /// Set the connect deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

fn parse_secs(key: &str, value: Option<String>) -> Option<Duration> {
    let value = value?;
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            warn!("Ignoring invalid {}={:?}", key, value);
            None
        }
    }
}
