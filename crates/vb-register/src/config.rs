//! Plugin configuration, stored as `plugins/VanillaBank/config.json`.

use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://cuptam4ik.ru/api/generateRegToken";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid endpoint URL {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("could not build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterConfig {
    /// Remote API that issues registration links.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Deadline for the whole request, including reading the body.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Threads in the background worker runtime. 0 is treated as 1.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// How often finished requests are delivered to players. 0 is treated as 1.
    #[serde(default = "default_poll_interval_ticks")]
    pub poll_interval_ticks: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_worker_threads() -> usize {
    2
}

fn default_poll_interval_ticks() -> u64 {
    1
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            worker_threads: default_worker_threads(),
            poll_interval_ticks: default_poll_interval_ticks(),
        }
    }
}

impl RegisterConfig {
    /// Parse and validate a config value handed over by the host.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_value(value)?;
        config.endpoint_url()?;
        if config.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout {
                field: "request_timeout_ms",
            });
        }
        if config.connect_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout {
                field: "connect_timeout_ms",
            });
        }
        Ok(config)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "endpoint": self.endpoint,
            "request_timeout_ms": self.request_timeout_ms,
            "connect_timeout_ms": self.connect_timeout_ms,
            "worker_threads": self.worker_threads,
            "poll_interval_ticks": self.poll_interval_ticks,
        })
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            url: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidEndpoint {
                url: self.endpoint.clone(),
                reason: format!("unsupported scheme {other:?}"),
            }),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads.max(1)
    }

    pub fn poll_interval_ticks(&self) -> u64 {
        self.poll_interval_ticks.max(1)
    }
}
