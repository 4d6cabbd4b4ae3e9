// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! OTLP trace-emission pipeline construction.
//!
//! Builds the exporter → batching span processor → tracer provider chain and
//! bridges it into the `tracing` ecosystem. Spans are buffered and flushed
//! on a background cadence; invocations never block on network delivery.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::trace as sdktrace;
use opentelemetry_sdk::{runtime, Resource};
use opentelemetry_otlp::WithExportConfig;
use tonic::metadata::{MetadataKey, MetadataMap, MetadataValue};
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::registry::LookupSpan;

use crate::config::{OtlpCompression, OtlpConfig};
use crate::error::TelemetryError;

/// Process-wide tracing state.
///
/// Written exactly once at startup, immutable and cheap to clone afterward.
/// Callers must not assume tracing succeeded: an inactive state means the
/// invocation path runs with no tracing overhead at all.
#[derive(Debug, Clone, Default)]
pub struct TracingState {
    active: bool,
    service_name: Option<String>,
}

impl TracingState {
    /// Tracing is disabled; invocations produce no spans.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Tracing is active under the given service identity.
    pub fn active(service_name: impl Into<String>) -> Self {
        Self {
            active: true,
            service_name: Some(service_name.into()),
        }
    }

    /// Whether an OTLP pipeline is registered for this process.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The service name attached to exported spans, if active.
    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }
}

impl OtlpCompression {
    fn as_otlp(self) -> Option<opentelemetry_otlp::Compression> {
        match self {
            Self::None => None,
            Self::Gzip => Some(opentelemetry_otlp::Compression::Gzip),
            Self::Zstd => Some(opentelemetry_otlp::Compression::Zstd),
        }
    }
}

/// Build the OTLP layer for the given configuration.
///
/// Constructs a tonic span exporter bound to the endpoint and auth headers,
/// wraps it in a batch span processor, registers the resulting provider as
/// the process's tracer source, and returns a `tracing` layer bridged to it.
/// The provider is also returned so the telemetry guard can flush it on
/// shutdown.
pub(crate) fn build_otlp_layer<S>(
    config: &OtlpConfig,
) -> Result<(OpenTelemetryLayer<S, sdktrace::Tracer>, sdktrace::TracerProvider), TelemetryError>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let mut metadata = MetadataMap::new();
    for (key, value) in &config.headers {
        let key = MetadataKey::from_bytes(key.as_bytes())
            .map_err(|e| TelemetryError::InvalidHeader(format!("{}: {}", key, e)))?;
        let value: MetadataValue<_> = value
            .parse()
            .map_err(|_| TelemetryError::InvalidHeader(format!("invalid value for {}", key)))?;
        metadata.insert(key, value);
    }

    let mut exporter_builder = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(&config.endpoint)
        .with_timeout(config.timeout)
        .with_metadata(metadata);

    if let Some(compression) = config.compression.as_otlp() {
        exporter_builder = exporter_builder.with_compression(compression);
    }

    let exporter = exporter_builder
        .build_span_exporter()
        .map_err(|e| TelemetryError::ExporterBuild(e.to_string()))?;

    let trace_config = sdktrace::Config::default().with_resource(Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
    ]));

    let provider = sdktrace::TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_config(trace_config)
        .build();

    global::set_tracer_provider(provider.clone());

    let tracer = provider.tracer(config.service_name.clone());
    Ok((tracing_opentelemetry::layer().with_tracer(tracer), provider))
}
