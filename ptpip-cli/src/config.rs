//! Configuration for the PTP/IP command-line client.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Responder connection settings.
    pub connection: ConnectionConfig,
    /// Interactive command server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// How to reach the responder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Responder host or IP.
    pub host: String,
    /// Command/Data port. Absent means the vendor default.
    pub port: Option<u16>,
    /// Vendor dialect: "fuji" or "generic".
    pub vendor: String,
    /// Friendly name offered to the responder; the camera stores it.
    pub friendly_name: String,
    /// Initiator GUID. Empty means a fresh random one per run.
    pub guid: String,
}

/// The line-oriented TCP command server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the command server.
    pub address: String,
    /// Bind port for the command server.
    pub port: u16,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            // The address Fuji cameras hand out on their own AP.
            host: "192.168.0.1".into(),
            port: None,
            vendor: "fuji".into(),
            friendly_name: "ptpip".into(),
            guid: String::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".into(),
            port: 55742,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl Config {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
