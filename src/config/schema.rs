//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Resource names the composition root knows how to build.
pub const KNOWN_RESOURCES: &[&str] = &["developers", "publishers", "genres", "consoles", "games"];

/// Root configuration for the catalog server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Disconnect handshake settings.
    pub disconnect: DisconnectConfig,

    /// Background connection monitor.
    pub monitor: MonitorConfig,

    /// Persistence backend selection.
    pub storage: StorageConfig,

    /// Resources to expose, each under its own path prefix.
    pub resources: Vec<String>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            disconnect: DisconnectConfig::default(),
            monitor: MonitorConfig::default(),
            storage: StorageConfig::default(),
            resources: KNOWN_RESOURCES.iter().map(|r| r.to_string()).collect(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8081").
    pub bind_address: String,

    /// Maximum concurrent connection handlers.
    ///
    /// `None` spawns one task per accepted connection with no admission limit.
    pub max_connections: Option<usize>,

    /// Upper bound on the request line plus headers, in bytes.
    pub max_header_bytes: usize,

    /// Upper bound on a declared request body, in bytes.
    pub max_body_bytes: usize,

    /// How long a stopped server waits for in-flight connections.
    pub drain_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8081".to_string(),
            max_connections: None,
            max_header_bytes: 8 * 1024,
            max_body_bytes: 1024 * 1024,
            drain_timeout_secs: 30,
        }
    }
}

/// Disconnect handshake configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisconnectConfig {
    /// Delay before acknowledging `POST /disconnect`, in milliseconds.
    pub delay_ms: u64,
}

impl Default for DisconnectConfig {
    fn default() -> Self {
        Self { delay_ms: 1000 }
    }
}

/// Connection monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Enable the periodic active-connection report.
    pub enabled: bool,

    /// Report interval in seconds.
    pub interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
        }
    }
}

/// Which repository implementation backs the resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    File,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend kind.
    pub backend: StorageBackend,

    /// Directory holding `<resource>.json` files for the file backend.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: "data".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
