// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry initialization and configuration.

use opentelemetry_sdk::trace as sdktrace;
use tracing::{warn, Level};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::OtlpConfig;
use crate::error::TelemetryError;

use super::otlp::{self, TracingState};

/// Configuration for telemetry initialization.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Default log level if RUST_LOG is not set.
    pub default_level: Level,

    /// Whether to include span events (enter/exit).
    pub include_span_events: bool,

    /// Whether to include target module path.
    pub include_target: bool,

    /// Whether to use ANSI colors in output.
    pub ansi_colors: bool,

    /// Custom filter directive (overrides default_level).
    pub filter_directive: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            include_span_events: false,
            include_target: true,
            ansi_colors: true,
            filter_directive: None,
        }
    }
}

impl TelemetryConfig {
    /// Create a config suitable for development with verbose output.
    pub fn development() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_span_events: true,
            include_target: true,
            ansi_colors: true,
            filter_directive: None,
        }
    }

    /// Create a config suitable for production with minimal output.
    pub fn production() -> Self {
        Self {
            default_level: Level::WARN,
            include_span_events: false,
            include_target: false,
            ansi_colors: false,
            filter_directive: None,
        }
    }

    /// Set the default log level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set a custom filter directive.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_directive = Some(filter.into());
        self
    }
}

/// Guard that flushes telemetry on drop.
///
/// Keep this guard alive for the duration of your program. When an OTLP
/// pipeline is active, dropping the guard shuts down the tracer provider,
/// flushing any spans still buffered in the batch processor.
pub struct TelemetryGuard {
    provider: Option<sdktrace::TracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if self.provider.take().is_some() {
            opentelemetry::global::shutdown_tracer_provider();
        }
    }
}

/// Initialize telemetry with the given configuration.
///
/// This should be called once at application startup. When `otlp` is
/// present, the OTLP trace-emission pipeline is constructed and bridged in
/// as an additional layer; a pipeline construction failure is logged and
/// degrades to log-only telemetry — it is never fatal.
///
/// Returns the guard plus the tracing state the invocation path consults.
///
/// # Example
///
/// ```rust,ignore
/// use chatspan::config::OtlpConfig;
/// use chatspan::telemetry::{init_telemetry, TelemetryConfig};
///
/// let (_guard, tracing_state) =
///     init_telemetry(&TelemetryConfig::default(), OtlpConfig::from_env().as_ref())?;
/// ```
pub fn init_telemetry(
    config: &TelemetryConfig,
    otlp: Option<&OtlpConfig>,
) -> Result<(TelemetryGuard, TracingState), TelemetryError> {
    // Build the filter - RUST_LOG env var takes precedence
    let filter = match &config.filter_directive {
        Some(directive) => EnvFilter::try_new(directive)
            .unwrap_or_else(|_| EnvFilter::new(format!("{}", config.default_level))),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{}", config.default_level))),
    };

    let span_events = if config.include_span_events {
        FmtSpan::ENTER | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = fmt::layer()
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .with_span_events(span_events)
        .compact();

    // Build the OTLP layer first; its failure must not block startup, and
    // the warning can only be emitted once the subscriber is installed.
    let (otel_layer, state, provider, degraded) = match otlp {
        Some(otlp_config) => match otlp::build_otlp_layer(otlp_config) {
            Ok((layer, provider)) => (
                Some(layer),
                TracingState::active(&otlp_config.service_name),
                Some(provider),
                None,
            ),
            Err(e) => (None, TracingState::disabled(), None, Some(e)),
        },
        None => (None, TracingState::disabled(), None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    if let Some(e) = degraded {
        warn!(error = %e, "OTLP pipeline construction failed, span export disabled");
    }

    Ok((TelemetryGuard { provider }, state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.default_level, Level::INFO);
        assert!(config.ansi_colors);
    }

    #[test]
    fn test_telemetry_config_development() {
        let config = TelemetryConfig::development();
        assert_eq!(config.default_level, Level::DEBUG);
        assert!(config.include_span_events);
    }

    #[test]
    fn test_telemetry_config_production() {
        let config = TelemetryConfig::production();
        assert_eq!(config.default_level, Level::WARN);
        assert!(!config.include_span_events);
    }

    #[test]
    fn test_telemetry_config_builder() {
        let config = TelemetryConfig::default()
            .with_level(Level::DEBUG)
            .with_filter("chatspan=trace");

        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.filter_directive, Some("chatspan=trace".to_string()));
    }

    #[test]
    fn test_guard_without_provider_is_inert() {
        let guard = TelemetryGuard { provider: None };
        drop(guard);
    }

    #[test]
    fn test_double_init_is_a_subscriber_error() {
        // Only one global subscriber can be installed per process; the loser
        // gets a typed error rather than a panic.
        let first = init_telemetry(&TelemetryConfig::default(), None);
        let second = init_telemetry(&TelemetryConfig::default(), None);

        assert!(first.is_ok());
        assert!(matches!(second, Err(TelemetryError::SubscriberInit(_))));
    }
}
