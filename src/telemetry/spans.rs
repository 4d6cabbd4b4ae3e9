// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Span helpers for the traced model invocation.

use std::time::Instant;

use tracing::{info_span, Span};

/// Span name for one model invocation.
pub const MODEL_INVOKE_SPAN: &str = "chat.invoke_model";

/// Extension trait for recording an invocation outcome into a span.
pub trait SpanExt {
    /// Record success or error attributes from a result.
    ///
    /// Success sets `llm.response.success = true`; failure sets it to false
    /// and records the error's message under `llm.response.error`.
    fn record_outcome<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_outcome<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("llm.response.success", true);
            }
            Err(e) => {
                self.record("llm.response.success", false);
                self.record("llm.response.error", e.to_string().as_str());
            }
        }
    }
}

/// RAII guard for one traced model invocation.
///
/// Opens the `chat.invoke_model` span on construction; duration and outcome
/// attributes are recorded when the guard is finished, and the span closes
/// when the last handle drops — on every exit path, success or error.
pub struct InvocationSpan {
    span: Span,
    start: Instant,
}

impl InvocationSpan {
    /// Start a new invocation span for the given model.
    pub fn start(model: &str) -> Self {
        let span = info_span!(
            "chat.invoke_model",
            model = %model,
            duration_ms = tracing::field::Empty,
            llm.response.success = tracing::field::Empty,
            llm.response.error = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
        }
    }

    /// Get the underlying tracing span.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Finish the span, recording duration and the invocation outcome.
    pub fn finish_with_result<T, E>(self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        let duration_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        self.span.record("duration_ms", duration_ms);
        self.span.record_outcome(result);
    }
}
