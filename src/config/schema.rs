//! Configuration schema definitions.
//!
//! File format read by the `service-supervisor` binary. All types derive
//! Serde traits for deserialization from TOML.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::options::Options;

/// Root configuration for the supervisor binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Shutdown behavior shared by all services.
    pub shutdown: ShutdownConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// HTTP listeners to supervise, started in this order.
    pub services: Vec<HttpServiceConfig>,
}

impl SupervisorConfig {
    /// Run options derived from this file. Lifecycle events go to `tracing`.
    pub fn options(&self) -> Options {
        Options::new()
            .tracing()
            .shutdown_timeout(Duration::from_secs(self.shutdown.timeout_secs))
            .force_exit_on_second_signal(self.shutdown.force_exit_on_second_signal)
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Grace period for each service's shutdown (0 = unbounded).
    pub timeout_secs: u64,

    /// Let a second SIGINT/SIGTERM terminate the process immediately.
    pub force_exit_on_second_signal: bool,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            force_exit_on_second_signal: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// JSON output instead of the human-readable format.
    pub json: bool,
}

/// One HTTP listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpServiceConfig {
    /// Service identifier for logs and errors.
    pub id: String,

    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Fixed response body.
    #[serde(default = "default_body")]
    pub body: String,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_body() -> String {
    "ok".to_string()
}

fn default_request_timeout() -> u64 {
    30
}
