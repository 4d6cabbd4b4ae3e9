// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Environment-driven configuration for the observability subsystems.
//!
//! Two independent configurations are recognized:
//!
//! - [`MonitorConfig`]: the APM monitoring path. Presence of the license
//!   credential enables it; absence disables monitoring for the process
//!   lifetime.
//! - [`OtlpConfig`]: the manual OTLP tracing path. Presence of the exporter
//!   auth headers enables it; absence disables span export.
//!
//! Absence of either is an expected condition, not an error. Malformed
//! optional values (bad compression mode, non-numeric timeout) degrade to
//! documented defaults with a warning rather than aborting startup. Both
//! structs are plain values so tests can construct alternate configurations
//! without touching the process environment.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Monitoring license credential; presence enables the monitoring path.
pub const ENV_MONITOR_LICENSE_KEY: &str = "NEW_RELIC_LICENSE_KEY";

/// Overrides the monitoring agent's default config file location.
pub const ENV_MONITOR_CONFIG_FILE: &str = "NEW_RELIC_CONFIG_FILE";

/// Environment label attached to all reported monitoring data.
pub const ENV_MONITOR_ENVIRONMENT: &str = "NEW_RELIC_ENVIRONMENT";

/// OTLP exporter destination endpoint.
pub const ENV_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Exporter auth headers (`key=value,key=value`); presence enables tracing.
pub const ENV_OTLP_HEADERS: &str = "OTEL_EXPORTER_OTLP_HEADERS";

/// Logical service identity attached to every span.
pub const ENV_OTLP_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";

/// Transport compression for exported spans: `gzip`, `zstd`, or `none`.
pub const ENV_OTLP_COMPRESSION: &str = "OTEL_EXPORTER_OTLP_COMPRESSION";

/// Exporter flush timeout in milliseconds.
pub const ENV_OTLP_TIMEOUT: &str = "OTEL_EXPORTER_OTLP_TIMEOUT";

/// Default OTLP endpoint when none is configured.
pub const DEFAULT_OTLP_ENDPOINT: &str = "https://otlp.nr-data.net";

/// Default service name when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "chatspan";

/// Default exporter timeout.
const DEFAULT_EXPORT_TIMEOUT_MS: u64 = 10_000;

// ============================================================================
// Monitoring Configuration
// ============================================================================

/// Configuration for the APM monitoring path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// License credential for the monitoring agent.
    pub license_key: String,

    /// Path to the agent's config file (file-based or agent default).
    pub config_file: Option<PathBuf>,

    /// Named environment label for reported data.
    pub environment: Option<String>,
}

impl MonitorConfig {
    /// Create a config with just a license key.
    pub fn new(license_key: impl Into<String>) -> Self {
        Self {
            license_key: license_key.into(),
            config_file: None,
            environment: None,
        }
    }

    /// Set the agent config file path.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Set the environment label.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Read the monitoring configuration from the process environment.
    ///
    /// Returns `None` when the license credential is unset, which disables
    /// the monitoring path entirely.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let license_key = get(ENV_MONITOR_LICENSE_KEY).filter(|k| !k.is_empty())?;

        Some(Self {
            license_key,
            config_file: get(ENV_MONITOR_CONFIG_FILE).map(PathBuf::from),
            environment: get(ENV_MONITOR_ENVIRONMENT),
        })
    }
}

// ============================================================================
// OTLP Tracing Configuration
// ============================================================================

/// Transport-level compression for exported spans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OtlpCompression {
    #[default]
    None,
    Gzip,
    Zstd,
}

impl std::str::FromStr for OtlpCompression {
    type Err = crate::error::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "gzip" => Ok(Self::Gzip),
            "zstd" => Ok(Self::Zstd),
            other => Err(crate::error::ConfigError::invalid(
                ENV_OTLP_COMPRESSION,
                format!("unknown compression mode: {}", other),
            )),
        }
    }
}

/// Configuration for the OTLP trace-emission pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtlpConfig {
    /// Exporter destination endpoint.
    pub endpoint: String,

    /// Auth headers attached to every export request.
    pub headers: Vec<(String, String)>,

    /// Logical service identity attached to every span.
    pub service_name: String,

    /// Transport compression mode.
    pub compression: OtlpCompression,

    /// Bounds the exporter flush duration, not the wrapped work.
    pub timeout: Duration,
}

impl OtlpConfig {
    /// Create a config with the given auth headers and defaults elsewhere.
    pub fn new(headers: Vec<(String, String)>) -> Self {
        Self {
            endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            headers,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            compression: OtlpCompression::None,
            timeout: Duration::from_millis(DEFAULT_EXPORT_TIMEOUT_MS),
        }
    }

    /// Set the exporter endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the service name.
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the compression mode.
    pub fn with_compression(mut self, compression: OtlpCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the exporter timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read the tracing configuration from the process environment.
    ///
    /// Returns `None` when the auth headers are unset, which disables the
    /// tracing path. This is an expected condition, not an error.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let raw_headers = get(ENV_OTLP_HEADERS).filter(|h| !h.is_empty())?;

        let compression = match get(ENV_OTLP_COMPRESSION) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(error = %e, "invalid compression mode, compression disabled");
                OtlpCompression::None
            }),
            None => OtlpCompression::None,
        };

        let timeout_ms = match get(ENV_OTLP_TIMEOUT) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(
                    value = %raw,
                    "invalid exporter timeout, using default of {}ms",
                    DEFAULT_EXPORT_TIMEOUT_MS
                );
                DEFAULT_EXPORT_TIMEOUT_MS
            }),
            None => DEFAULT_EXPORT_TIMEOUT_MS,
        };

        Some(Self {
            endpoint: get(ENV_OTLP_ENDPOINT)
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_OTLP_ENDPOINT.to_string()),
            headers: parse_headers(&raw_headers),
            service_name: get(ENV_OTLP_SERVICE_NAME)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            compression,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

/// Parse the `key=value,key=value` header list format.
///
/// Entries without an `=` are skipped; values may themselves contain `=`.
fn parse_headers(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|entry| {
            let (key, value) = entry.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers("api-key=abc123,other=x=y");
        assert_eq!(
            headers,
            vec![
                ("api-key".to_string(), "abc123".to_string()),
                ("other".to_string(), "x=y".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_headers_skips_malformed() {
        let headers = parse_headers("api-key=abc,no-equals,=novalue");
        assert_eq!(headers, vec![("api-key".to_string(), "abc".to_string())]);
    }

    #[test]
    fn test_compression_from_str() {
        assert_eq!("gzip".parse::<OtlpCompression>().unwrap(), OtlpCompression::Gzip);
        assert_eq!("GZIP".parse::<OtlpCompression>().unwrap(), OtlpCompression::Gzip);
        assert_eq!("zstd".parse::<OtlpCompression>().unwrap(), OtlpCompression::Zstd);
        assert_eq!("none".parse::<OtlpCompression>().unwrap(), OtlpCompression::None);
        assert!("brotli".parse::<OtlpCompression>().is_err());
    }

    #[test]
    fn test_monitor_config_absent_without_license() {
        assert!(MonitorConfig::from_lookup(env(&[])).is_none());
        assert!(MonitorConfig::from_lookup(env(&[(ENV_MONITOR_LICENSE_KEY, "")])).is_none());
    }

    #[test]
    fn test_monitor_config_from_lookup() {
        let config = MonitorConfig::from_lookup(env(&[
            (ENV_MONITOR_LICENSE_KEY, "abc123"),
            (ENV_MONITOR_CONFIG_FILE, "/etc/newrelic.ini"),
            (ENV_MONITOR_ENVIRONMENT, "staging"),
        ]))
        .unwrap();

        assert_eq!(config.license_key, "abc123");
        assert_eq!(config.config_file, Some(PathBuf::from("/etc/newrelic.ini")));
        assert_eq!(config.environment, Some("staging".to_string()));
    }

    #[test]
    fn test_otlp_config_absent_without_headers() {
        assert!(OtlpConfig::from_lookup(env(&[])).is_none());
        assert!(OtlpConfig::from_lookup(env(&[(ENV_OTLP_HEADERS, "")])).is_none());
    }

    #[test]
    fn test_otlp_config_defaults() {
        let config = OtlpConfig::from_lookup(env(&[(ENV_OTLP_HEADERS, "api-key=secret")])).unwrap();

        assert_eq!(config.endpoint, DEFAULT_OTLP_ENDPOINT);
        assert_eq!(config.service_name, DEFAULT_SERVICE_NAME);
        assert_eq!(config.compression, OtlpCompression::None);
        assert_eq!(config.timeout, Duration::from_millis(10_000));
        assert_eq!(config.headers.len(), 1);
    }

    #[test]
    fn test_otlp_config_overrides() {
        let config = OtlpConfig::from_lookup(env(&[
            (ENV_OTLP_HEADERS, "api-key=secret"),
            (ENV_OTLP_ENDPOINT, "https://collector.example.com:4317"),
            (ENV_OTLP_SERVICE_NAME, "my-service"),
            (ENV_OTLP_COMPRESSION, "gzip"),
            (ENV_OTLP_TIMEOUT, "5000"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint, "https://collector.example.com:4317");
        assert_eq!(config.service_name, "my-service");
        assert_eq!(config.compression, OtlpCompression::Gzip);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_otlp_config_malformed_values_degrade() {
        let config = OtlpConfig::from_lookup(env(&[
            (ENV_OTLP_HEADERS, "api-key=secret"),
            (ENV_OTLP_COMPRESSION, "brotli"),
            (ENV_OTLP_TIMEOUT, "soon"),
        ]))
        .unwrap();

        assert_eq!(config.compression, OtlpCompression::None);
        assert_eq!(config.timeout, Duration::from_millis(10_000));
    }

    #[test]
    fn test_otlp_config_builder() {
        let config = OtlpConfig::new(vec![("api-key".to_string(), "secret".to_string())])
            .with_endpoint("https://collector.example.com:4317")
            .with_service_name("svc")
            .with_compression(OtlpCompression::Zstd)
            .with_timeout(Duration::from_secs(1));

        assert_eq!(config.endpoint, "https://collector.example.com:4317");
        assert_eq!(config.compression, OtlpCompression::Zstd);
    }
}
