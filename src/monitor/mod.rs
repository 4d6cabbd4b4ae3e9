// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Monitoring bootstrap - one-time APM agent startup.
//!
//! The monitoring path activates when the license credential is present in
//! the environment. Bootstrap installs the lazy hook stand-in *before* the
//! agent initializes, so the host framework can consult instrumentation
//! hooks at any point during its own startup, then initializes the agent
//! with lifecycle-hook installation suppressed (the stand-in already owns
//! that slot).
//!
//! Any failure here degrades to "monitoring disabled" — it must never
//! prevent the rest of the process from starting.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chatspan::config::MonitorConfig;
//! use chatspan::monitor::{bootstrap_monitoring, LogReportingAgent};
//!
//! let monitoring = bootstrap_monitoring(
//!     MonitorConfig::from_env(),
//!     Arc::new(LogReportingAgent::new()),
//! );
//! if monitoring.state().is_enabled() {
//!     // capabilities recorded, hook will resolve on first use
//! }
//! ```

mod hook;

pub use hook::{InstrumentHook, LazyHook, NoopHook, TracingHook};

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::MonitorError;

/// A named monitoring capability the agent may activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DistributedTracing,
    LlmCallTracking,
    ErrorTracking,
    TransactionTracking,
}

/// Process-wide monitoring state.
///
/// Written exactly once by [`bootstrap_monitoring`], read-only afterward.
#[derive(Debug, Clone, Default)]
pub struct MonitoringState {
    enabled: bool,
    capabilities: HashSet<Capability>,
}

impl MonitoringState {
    /// Monitoring is disabled for the process lifetime.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Monitoring initialized successfully with the given capabilities.
    pub fn with_capabilities(capabilities: HashSet<Capability>) -> Self {
        Self {
            enabled: true,
            capabilities,
        }
    }

    /// Whether the monitoring agent successfully initialized.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a named capability is active.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Options passed to the monitoring agent's initializer.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// License credential for the agent.
    pub license_key: String,

    /// Path to the agent's configuration (file-based or agent default).
    pub config_file: Option<PathBuf>,

    /// Named environment label tagged onto all reported data.
    pub environment: Option<String>,

    /// Instructs the agent not to install its own lifecycle hooks.
    ///
    /// The bootstrap owns the hook slot through [`LazyHook`]; letting the
    /// agent also register would race with the host framework's startup.
    pub suppress_lifecycle_hooks: bool,
}

/// The monitoring agent, as seen by the bootstrap.
///
/// The agent library itself is an external collaborator; this trait covers
/// only the two operations the core needs from it. [`LogReportingAgent`] is
/// the built-in implementation; tests substitute mocks.
#[cfg_attr(test, mockall::automock)]
pub trait ApmAgent: Send + Sync {
    /// Initialize the agent, returning the set of active capabilities.
    fn initialize(&self, options: &InitOptions) -> Result<HashSet<Capability>, MonitorError>;

    /// The agent's real instrumentation hook.
    ///
    /// Only safe to call after [`initialize`](ApmAgent::initialize) has
    /// completed; the lazy proxy defers this lookup until then.
    fn instrument_hook(&self) -> Result<Arc<dyn InstrumentHook>, MonitorError>;
}

/// The monitoring subsystem after bootstrap: state plus the hook stand-in.
pub struct Monitoring {
    state: MonitoringState,
    hook: Arc<LazyHook>,
}

impl Monitoring {
    /// The process-wide monitoring state.
    pub fn state(&self) -> &MonitoringState {
        &self.state
    }

    /// The hook stand-in, usable as an [`InstrumentHook`] from process start.
    pub fn hook(&self) -> Arc<LazyHook> {
        self.hook.clone()
    }
}

/// One-time monitoring startup.
///
/// With no config (license credential absent) monitoring is disabled for the
/// process lifetime and every hook callback is a no-op. Otherwise the hook
/// stand-in is installed first, then the agent is initialized; an
/// initialization failure is logged and degrades to disabled.
pub fn bootstrap_monitoring(
    config: Option<MonitorConfig>,
    agent: Arc<dyn ApmAgent>,
) -> Monitoring {
    let Some(config) = config else {
        debug!("monitoring license key not set, monitoring disabled");
        return Monitoring {
            state: MonitoringState::disabled(),
            hook: Arc::new(LazyHook::disabled()),
        };
    };

    // The stand-in must exist before the agent runs: the host framework may
    // consult instrumentation hooks during its own startup.
    let hook = {
        let agent = agent.clone();
        Arc::new(LazyHook::new(Box::new(move || agent.instrument_hook())))
    };

    let options = InitOptions {
        license_key: config.license_key,
        config_file: config.config_file,
        environment: config.environment,
        suppress_lifecycle_hooks: true,
    };

    let state = match agent.initialize(&options) {
        Ok(capabilities) => {
            info!(
                capabilities = capabilities.len(),
                environment = options.environment.as_deref().unwrap_or("default"),
                "monitoring agent initialized"
            );
            MonitoringState::with_capabilities(capabilities)
        }
        Err(e) => {
            warn!(error = %e, "monitoring agent initialization failed, monitoring disabled");
            MonitoringState::disabled()
        }
    };

    Monitoring { state, hook }
}

/// Built-in monitoring agent that reports through `tracing` events.
///
/// Activates every capability and hands out a [`TracingHook`]. Stands in for
/// a real APM agent library in deployments that only need log-visible
/// monitoring data.
pub struct LogReportingAgent;

impl LogReportingAgent {
    /// Create a new log-reporting agent.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogReportingAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl ApmAgent for LogReportingAgent {
    fn initialize(&self, options: &InitOptions) -> Result<HashSet<Capability>, MonitorError> {
        if options.license_key.is_empty() {
            return Err(MonitorError::InitFailed("empty license key".to_string()));
        }

        debug!(
            config_file = ?options.config_file,
            suppress_lifecycle_hooks = options.suppress_lifecycle_hooks,
            "log-reporting agent initialized"
        );

        Ok(HashSet::from([
            Capability::DistributedTracing,
            Capability::LlmCallTracking,
            Capability::ErrorTracking,
            Capability::TransactionTracking,
        ]))
    }

    fn instrument_hook(&self) -> Result<Arc<dyn InstrumentHook>, MonitorError> {
        Ok(Arc::new(TracingHook::new()))
    }
}
