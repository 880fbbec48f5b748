use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HotlineError, Result};
use crate::operator::MAX_OPERATORS;

/// Environment variable prefix, e.g. `HOTLINE__OPERATORS__COUNT=4`
pub const ENV_PREFIX: &str = "HOTLINE";

/// Hotline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotlineConfig {
    /// Operator pool settings
    pub operators: OperatorsConfig,

    /// Routing and ring timer settings
    pub routing: RoutingConfig,

    /// TCP listener settings
    pub server: ServerConfig,

    /// Log output settings
    pub logging: LoggingConfig,
}

/// Operator pool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorsConfig {
    /// Number of operators, named `A`, `B`, ... in order
    pub count: usize,
}

/// Routing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// How long an operator may ring before the call is recovered (milliseconds)
    pub ring_timeout_ms: u64,

    /// Arm ring timers at all
    pub enable_ring_timeout: bool,

    /// Pending commands buffered ahead of the engine task
    pub command_channel_capacity: usize,

    /// Notifications buffered per subscriber before it lags
    pub notification_capacity: usize,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,

    /// Longest request line accepted from a client, in bytes
    pub max_frame_length: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,

    /// Include file and line in each event
    pub file_info: bool,

    /// Log span open/close events
    pub log_spans: bool,
}

impl HotlineConfig {
    /// Load configuration from an optional file layered under `HOTLINE__*`
    /// environment variables. Missing keys fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let loaded: HotlineConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.operators.count == 0 {
            return Err(HotlineError::config("operators.count must be at least 1"));
        }
        if self.operators.count > MAX_OPERATORS {
            return Err(HotlineError::config(format!(
                "operators.count {} exceeds the supported maximum of {}",
                self.operators.count, MAX_OPERATORS
            )));
        }

        if self.routing.ring_timeout_ms == 0 {
            return Err(HotlineError::config("routing.ring_timeout_ms must be greater than 0"));
        }
        if self.routing.command_channel_capacity == 0 {
            return Err(HotlineError::config(
                "routing.command_channel_capacity must be greater than 0",
            ));
        }
        if self.routing.notification_capacity == 0 {
            return Err(HotlineError::config(
                "routing.notification_capacity must be greater than 0",
            ));
        }

        self.server.socket_addr()?;
        if self.server.max_frame_length == 0 {
            return Err(HotlineError::config("server.max_frame_length must be greater than 0"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(HotlineError::config("logging.level cannot be empty"));
        }

        Ok(())
    }
}

impl RoutingConfig {
    /// Ring timeout, or `None` when timers are disabled
    pub fn ring_timeout(&self) -> Option<Duration> {
        self.enable_ring_timeout
            .then(|| Duration::from_millis(self.ring_timeout_ms))
    }
}

impl ServerConfig {
    /// Parsed listen address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr.parse().map_err(|e| {
            HotlineError::config(format!("invalid server.bind_addr {}: {}", self.bind_addr, e))
        })
    }
}

impl Default for OperatorsConfig {
    fn default() -> Self {
        Self { count: 2 }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            ring_timeout_ms: 10_000, // 10 seconds
            enable_ring_timeout: true,
            command_channel_capacity: 256,
            notification_capacity: 64,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5678".to_string(),
            max_frame_length: 8 * 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
            log_spans: false,
        }
    }
}
