// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the chatspan agent.
//!
//! This module provides strongly-typed errors for different parts of the
//! application, using `thiserror` for ergonomic error definitions and
//! `anyhow` for error propagation.
//!
//! Errors fall into two categories with very different handling:
//!
//! - [`ProviderError`]: raised by the wrapped unit of work (the model call).
//!   Recorded on the invocation span, then re-raised unchanged to the caller.
//! - [`MonitorError`] / [`TelemetryError`]: raised during observability
//!   startup. Caught at the bootstrap boundary, logged, and degraded to
//!   "subsystem disabled" — never fatal to the process.

use thiserror::Error;

/// Errors that can occur during provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("API error: {message}")]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Response parsing error: {0}")]
    ParseError(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl ProviderError {
    /// Create an API error with status code.
    pub fn api(message: impl Into<String>, status_code: u16) -> Self {
        Self::ApiError {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create an API error without status code.
    pub fn api_message(message: impl Into<String>) -> Self {
        Self::ApiError {
            message: message.into(),
            status_code: None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::NetworkError(_) | Self::Timeout(_)
        )
    }
}

/// Errors that can occur during configuration parsing.
///
/// Absence of an optional environment variable is not an error; these cover
/// malformed values only.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    /// Create an invalid-value error for a named field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur during monitoring-agent startup or hook resolution.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Monitoring agent initialization failed: {0}")]
    InitFailed(String),

    #[error("Instrumentation hook unavailable: {0}")]
    HookUnavailable(String),
}

/// Errors that can occur while constructing the trace-emission pipeline.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to build span exporter: {0}")]
    ExporterBuild(String),

    #[error("Invalid exporter header: {0}")]
    InvalidHeader(String),

    #[error("Failed to initialize subscriber: {0}")]
    SubscriberInit(String),
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_retryable() {
        assert!(ProviderError::RateLimited("wait 1s".to_string()).is_retryable());
        assert!(ProviderError::NetworkError("timeout".to_string()).is_retryable());
        assert!(ProviderError::Timeout(30000).is_retryable());
        assert!(!ProviderError::AuthError("invalid key".to_string()).is_retryable());
        assert!(!ProviderError::ModelNotFound("gpt-5".to_string()).is_retryable());
    }

    #[test]
    fn test_provider_error_api() {
        let err = ProviderError::api("Bad request", 400);
        match err {
            ProviderError::ApiError {
                message,
                status_code,
            } => {
                assert_eq!(message, "Bad request");
                assert_eq!(status_code, Some(400));
            }
            _ => panic!("Expected ApiError"),
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("OTEL_EXPORTER_OTLP_TIMEOUT", "not a number");
        let display = format!("{}", err);
        assert!(display.contains("OTEL_EXPORTER_OTLP_TIMEOUT"));
        assert!(display.contains("not a number"));
    }

    #[test]
    fn test_monitor_error_display() {
        let err = MonitorError::InitFailed("license rejected".to_string());
        assert!(format!("{}", err).contains("license rejected"));
    }
}
