// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Instrumentation hook interface and the lazy resolve-once proxy.
//!
//! The host framework may consult instrumentation hooks during its own
//! startup, before the monitoring agent has finished initializing. A
//! premature real lookup would fail, so [`LazyHook`] stands in for the real
//! hook from process start: every callback triggers at most one resolution
//! attempt, forwards to the resolved hook when one is present, and otherwise
//! no-ops. A failed resolution is permanent; the proxy never retries.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::MonitorError;

/// Callbacks an instrumentation hook exposes to the agent.
///
/// Implementations observe but never control: no callback may fail or panic,
/// and none may alter the functional outcome of the work it observes.
pub trait InstrumentHook: Send + Sync {
    /// A unit of work (transaction) has started.
    fn transaction_started(&self, name: &str);

    /// A unit of work has finished.
    fn transaction_finished(&self, name: &str, success: bool);

    /// A model call completed.
    fn record_llm_call(&self, model: &str, duration: Duration, success: bool);

    /// An error surfaced from the wrapped work.
    fn notice_error(&self, message: &str);
}

/// An [`InstrumentHook`] that does nothing.
///
/// The permanent fallback when the real hook cannot be resolved.
pub struct NoopHook;

impl InstrumentHook for NoopHook {
    fn transaction_started(&self, _name: &str) {}
    fn transaction_finished(&self, _name: &str, _success: bool) {}
    fn record_llm_call(&self, _model: &str, _duration: Duration, _success: bool) {}
    fn notice_error(&self, _message: &str) {}
}

/// Resolves the real instrumentation hook once it is safe to do so.
type HookResolver = Box<dyn Fn() -> Result<Arc<dyn InstrumentHook>, MonitorError> + Send + Sync>;

/// Lazy stand-in for the real instrumentation hook.
///
/// Installed before the monitoring agent initializes. The first callback (or
/// an explicit [`resolve`](LazyHook::resolve)) runs the resolver exactly
/// once; on failure the proxy permanently degrades to no-op behavior. Either
/// way, callbacks never fail.
pub struct LazyHook {
    resolved: OnceCell<Option<Arc<dyn InstrumentHook>>>,
    resolver: HookResolver,
}

impl LazyHook {
    /// Create an unresolved proxy around a resolver.
    pub fn new(resolver: HookResolver) -> Self {
        Self {
            resolved: OnceCell::new(),
            resolver,
        }
    }

    /// Create a proxy that is already permanently no-op.
    ///
    /// Used when monitoring is disabled for the process lifetime.
    pub fn disabled() -> Self {
        Self {
            resolved: OnceCell::with_value(None),
            resolver: Box::new(|| {
                Err(MonitorError::HookUnavailable(
                    "monitoring disabled".to_string(),
                ))
            }),
        }
    }

    /// Attempt resolution if it has not been attempted yet.
    ///
    /// Idempotent: the resolver runs at most once for the life of the proxy,
    /// and the first outcome (real hook or permanent no-op) is final.
    /// Returns whether a real hook is present.
    pub fn resolve(&self) -> bool {
        self.resolved
            .get_or_init(|| match (self.resolver)() {
                Ok(hook) => {
                    debug!("instrumentation hook resolved");
                    Some(hook)
                }
                Err(e) => {
                    warn!(error = %e, "instrumentation hook resolution failed, falling back to no-op");
                    None
                }
            })
            .is_some()
    }

    /// Whether a resolution attempt has completed (successfully or not).
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Whether a real hook is present behind the proxy.
    ///
    /// Triggers resolution as a side effect if not yet attempted.
    pub fn is_active(&self) -> bool {
        self.resolve()
    }

    fn delegate(&self) -> Option<&Arc<dyn InstrumentHook>> {
        self.resolve();
        self.resolved.get().and_then(|h| h.as_ref())
    }
}

impl InstrumentHook for LazyHook {
    fn transaction_started(&self, name: &str) {
        if let Some(hook) = self.delegate() {
            hook.transaction_started(name);
        }
    }

    fn transaction_finished(&self, name: &str, success: bool) {
        if let Some(hook) = self.delegate() {
            hook.transaction_finished(name, success);
        }
    }

    fn record_llm_call(&self, model: &str, duration: Duration, success: bool) {
        if let Some(hook) = self.delegate() {
            hook.record_llm_call(model, duration, success);
        }
    }

    fn notice_error(&self, message: &str) {
        if let Some(hook) = self.delegate() {
            hook.notice_error(message);
        }
    }
}

/// An [`InstrumentHook`] that emits structured `tracing` events.
///
/// Wire to any `tracing`-compatible subscriber; with the OTLP layer active
/// these events ride along inside the enclosing invocation span.
pub struct TracingHook;

impl TracingHook {
    /// Create a new `TracingHook`.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingHook {
    fn default() -> Self {
        Self::new()
    }
}

impl InstrumentHook for TracingHook {
    fn transaction_started(&self, name: &str) {
        debug!(transaction = %name, "chatspan.transaction.start");
    }

    fn transaction_finished(&self, name: &str, success: bool) {
        debug!(transaction = %name, success, "chatspan.transaction.finish");
    }

    fn record_llm_call(&self, model: &str, duration: Duration, success: bool) {
        debug!(
            model = %model,
            duration_ms = duration.as_millis() as u64,
            success,
            "chatspan.llm.call"
        );
    }

    fn notice_error(&self, message: &str) {
        warn!(error = %message, "chatspan.error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHook {
        calls: Arc<AtomicUsize>,
    }

    impl InstrumentHook for CountingHook {
        fn transaction_started(&self, _name: &str) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        fn transaction_finished(&self, _name: &str, _success: bool) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        fn record_llm_call(&self, _model: &str, _duration: Duration, _success: bool) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        fn notice_error(&self, _message: &str) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_resolver_runs_at_most_once() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));

        let hook = {
            let attempts = attempts.clone();
            let calls = calls.clone();
            LazyHook::new(Box::new(move || {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(CountingHook {
                    calls: calls.clone(),
                }) as Arc<dyn InstrumentHook>)
            }))
        };

        assert!(!hook.is_resolved());
        hook.transaction_started("work");
        hook.record_llm_call("echo", Duration::from_millis(1), true);
        assert!(hook.resolve());
        assert!(hook.resolve());

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(hook.is_resolved());
    }

    #[test]
    fn test_failed_resolution_is_permanent_noop() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let hook = {
            let attempts = attempts.clone();
            LazyHook::new(Box::new(move || {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(MonitorError::HookUnavailable("not loaded".to_string()))
            }))
        };

        // Every callback is safe to call and never retries resolution.
        hook.transaction_started("work");
        hook.transaction_finished("work", true);
        hook.record_llm_call("gpt-3.5-turbo", Duration::from_millis(5), false);
        hook.notice_error("boom");
        assert!(!hook.resolve());

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(hook.is_resolved());
        assert!(!hook.is_active());
    }

    #[test]
    fn test_disabled_hook_never_resolves() {
        let hook = LazyHook::disabled();
        assert!(hook.is_resolved());
        assert!(!hook.is_active());
        hook.notice_error("ignored");
    }

    #[test]
    fn test_noop_hook_accepts_everything() {
        let hook = NoopHook;
        hook.transaction_started("t");
        hook.transaction_finished("t", false);
        hook.record_llm_call("m", Duration::ZERO, true);
        hook.notice_error("e");
    }
}
