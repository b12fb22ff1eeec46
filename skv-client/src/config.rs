//! # Client Configuration
//!
//! Seeds, timeouts and the connect retry delay. Everything here can be
//! overridden so tests run against local stores with zero delay; the record
//! TTL is fixed and lives in `skv_common::RECORD_TTL`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cluster entry point used when no seed is configured.
pub const DEFAULT_SEED: &str = "cas-0:6379";

/// Default per-attempt connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default per-query timeout.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause between failed connection attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Configuration for `KvClient` and its connection manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Store addresses tried in order on every attempt, e.g. "10.0.0.5:6379".
    pub seeds: Vec<String>,
    /// Connect timeout per seed, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Timeout applied to every query, in milliseconds.
    pub query_timeout_ms: u64,
    /// Delay between failed connection attempts, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            seeds: vec![DEFAULT_SEED.to_string()],
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT.as_millis() as u64,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at the given seeds.
    pub fn with_seeds<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ClientConfig {
            seeds: seeds.into_iter().map(Into::into).collect(),
            ..ClientConfig::default()
        }
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[inline]
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    #[inline]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
