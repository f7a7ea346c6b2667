//! WSAPI transport configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the JSON/HTTPS control surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    /// Base URL of the WSAPI, ending in `/api/v{n}`
    pub api_url: String,

    /// Verify the TLS certificate chain
    pub secure: bool,

    /// Suppress the warning emitted when TLS verification is off
    pub suppress_ssl_warnings: bool,

    /// Log requests and responses at debug level
    pub http_log_debug: bool,

    /// Per-request timeout; `None` means unlimited
    #[serde(with = "super::opt_secs")]
    pub timeout: Option<Duration>,

    /// Retry behavior for transient failures
    pub retry: RetryConfig,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            secure: false,
            suppress_ssl_warnings: false,
            http_log_debug: false,
            timeout: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Retry parameters for the WSAPI request loop.
///
/// Only service-unavailable and connection errors are retried; the delay
/// between attempts evolves as `delay = delay * backoff + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts before the last error surfaces
    pub tries: u32,

    /// Delay before the first retry
    #[serde(with = "super::secs")]
    pub initial_delay: Duration,

    /// Multiplier applied to the delay after each retryable failure
    pub backoff: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            tries: 5,
            initial_delay: Duration::ZERO,
            backoff: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RestConfig::default();
        assert!(!config.secure);
        assert!(!config.suppress_ssl_warnings);
        assert!(!config.http_log_debug);
        assert!(config.timeout.is_none());
        assert_eq!(config.retry.tries, 5);
        assert_eq!(config.retry.backoff, 2);
        assert_eq!(config.retry.initial_delay, Duration::ZERO);
    }
}
