//! Client configuration.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every request a client issues. Read-only once the
/// client is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the MemoryKV server, without a trailing slash.
    pub host: String,
    /// Deadline for a whole request in milliseconds. `None` waits forever.
    pub timeout_ms: Option<u64>,
    /// Redirect hops followed before giving up.
    pub max_redirects: u32,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:8080".to_string(),
            timeout_ms: None,
            max_redirects: 10,
            user_agent: concat!("memkv-rust/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `MEMKV_HOST` and `MEMKV_TIMEOUT_MS`.
    ///
    /// A timeout that is not a number is ignored; 0 means no deadline.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = env::var("MEMKV_HOST") {
            config.host = host;
        }
        config.timeout_ms = env::var("MEMKV_TIMEOUT_MS")
            .ok()
            .and_then(|s| parse_timeout_ms(&s));
        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    pub fn with_max_redirects(mut self, max: u32) -> Self {
        self.max_redirects = max;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

fn parse_timeout_ms(raw: &str) -> Option<u64> {
    raw.trim().parse().ok().filter(|&ms| ms > 0)
}
