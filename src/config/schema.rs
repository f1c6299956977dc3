//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the edge server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Public directory served for non-API paths.
    pub static_files: StaticConfig,

    /// API routing settings.
    pub api: ApiConfig,

    /// Response compression settings.
    pub compression: CompressionConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Server-Sent Events settings.
    pub sse: SseConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind host (e.g., "0.0.0.0").
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// How long in-flight requests (including open event streams) may run
    /// after shutdown is requested.
    pub drain_timeout_secs: u64,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            drain_timeout_secs: 10,
        }
    }
}

/// Static file serving configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticConfig {
    /// Public root directory.
    pub root: PathBuf,

    /// File served for directory requests.
    pub index_file: String,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public"),
            index_file: "index.html".to_string(),
        }
    }
}

/// API routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Path prefix reserved for API routes.
    pub prefix: String,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,

    /// Log handler failure details.
    pub debug: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api/".to_string(),
            max_body_bytes: 1024 * 1024,
            debug: false,
        }
    }
}

/// Compression configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Negotiate compression at all.
    pub enabled: bool,

    /// gzip/deflate level (0-9).
    pub gzip_level: u32,

    /// Brotli quality (0-11).
    pub brotli_quality: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gzip_level: 6,
            brotli_quality: 5,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable the per-client request limit hook.
    pub enabled: bool,

    /// Requests allowed per client per window.
    pub max_requests: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Interval between sweeps of expired records, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_requests: 100,
            window_ms: 60_000,
            sweep_interval_secs: 60,
        }
    }
}

/// Server-Sent Events configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SseConfig {
    /// Frames buffered per session before `send` waits.
    pub channel_capacity: usize,

    /// Interval between `:heartbeat` frames on open sessions, in seconds
    /// (0 disables them).
    pub heartbeat_secs: u64,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            heartbeat_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: EdgeConfig = toml::from_str(
            r#"
            [listener]
            port = 8080

            [api]
            debug = true
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert!(config.api.debug);
        assert_eq!(config.api.prefix, "/api/");
        assert_eq!(config.static_files.index_file, "index.html");
        assert!(!config.rate_limit.enabled);
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let listener = ListenerConfig {
            host: "127.0.0.1".into(),
            port: 4000,
            ..ListenerConfig::default()
        };
        assert_eq!(listener.bind_address(), "127.0.0.1:4000");
    }
}
