// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # chatspan
//!
//! A small conversational agent with production observability wiring.
//!
//! chatspan answers chat prompts through an OpenAI-compatible model
//! backend (or a deterministic echo fallback when no credential is set)
//! and demonstrates how to bolt monitoring onto that path without ever
//! letting monitoring break it:
//!
//! - **APM monitoring** ([`monitor`]): credential-gated agent
//!   initialization with a lazy instrumentation hook that degrades
//!   permanently to a no-op if it cannot be resolved
//! - **Trace export** ([`telemetry`]): an env-gated OTLP span pipeline
//!   wrapping each model call in a `chat.invoke_model` span
//! - **Providers** ([`providers`]): the model backends, including the
//!   no-credential echo mode
//! - **Agent** ([`agent`]): the unit-of-work handler tying it together
//!
//! The rule every module obeys: observability failures degrade, they never
//! fail the chat path.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use chatspan::agent::ChatNode;
//! use chatspan::providers::create_provider_from_env;
//! use chatspan::types::ChatState;
//!
//! let node = ChatNode::with_provider(create_provider_from_env(None));
//! let state = node.invoke(ChatState::from_user("Hello, world!")).await?;
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod monitor;
pub mod providers;
pub mod telemetry;
pub mod types;

pub use agent::ChatNode;
pub use error::Result;
pub use types::{ChatState, Message, Provider, ProviderResponse, Role};

/// Crate version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
