// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry and tracing infrastructure.
//!
//! This module provides the observability wiring for chatspan:
//!
//! - **Logging**: structured logging via `tracing` with env-filter control
//! - **OTLP export**: an optional trace-emission pipeline (exporter →
//!   batching processor → provider) activated by environment configuration
//! - **Invocation spans**: the `chat.invoke_model` span wrapping each unit
//!   of work, with success/error attributes on every exit path
//!
//! # Usage
//!
//! Initialize telemetry once at application startup:
//!
//! ```rust,ignore
//! use chatspan::config::OtlpConfig;
//! use chatspan::telemetry::{init_telemetry, TelemetryConfig};
//!
//! let (_guard, tracing_state) =
//!     init_telemetry(&TelemetryConfig::default(), OtlpConfig::from_env().as_ref())?;
//! ```
//!
//! Span export is strictly additive: when the pipeline is inactive (or its
//! construction failed), the invocation path runs unchanged with no tracing
//! overhead, and the guard degrades to a log-only flush.

mod init;
mod otlp;
mod spans;

pub use init::{init_telemetry, TelemetryConfig, TelemetryGuard};
pub use otlp::TracingState;
pub use spans::{InvocationSpan, SpanExt, MODEL_INVOKE_SPAN};
