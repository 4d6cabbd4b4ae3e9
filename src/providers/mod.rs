// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Model provider implementations.
//!
//! This module provides implementations of the [`Provider`] trait:
//!
//! - [`openai::OpenAIProvider`] - OpenAI and OpenAI-compatible APIs
//! - [`echo::EchoProvider`] - deterministic echo fallback when no
//!   credential is configured
//!
//! # Quick Start
//!
//! Just set an environment variable and go:
//!
//! ```bash
//! export OPENAI_API_KEY=your-key
//! ```
//!
//! Without a key, the agent degrades to echo mode rather than failing:
//!
//! ```rust,ignore
//! use chatspan::providers::create_provider_from_env;
//!
//! let provider = create_provider_from_env(None);
//! let response = provider.chat(&messages).await?;
//! ```

pub mod echo;
pub mod openai;

pub use echo::{EchoProvider, ECHO_PREFIX};
pub use openai::{OpenAIProvider, DEFAULT_MODEL, OPENAI_BASE_URL};

use tracing::info;

use crate::types::BoxedProvider;

/// Model credential; absence selects echo mode.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Override for the API base URL.
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";

/// Override for the default model.
pub const ENV_MODEL: &str = "CHATSPAN_MODEL";

/// Create a provider from environment variables.
///
/// `OPENAI_API_KEY` present selects the real model backend; absent selects
/// the deterministic echo fallback. Either way the caller gets a working
/// provider — a missing credential is a degradation, never a startup error.
///
/// | Variable | Description |
/// |----------|-------------|
/// | `OPENAI_API_KEY` | Model credential; unset enables echo mode |
/// | `OPENAI_BASE_URL` | Custom API base URL |
/// | `CHATSPAN_MODEL` | Override the default model |
pub fn create_provider_from_env(model_override: Option<&str>) -> BoxedProvider {
    match std::env::var(ENV_OPENAI_API_KEY) {
        Ok(api_key) if !api_key.is_empty() => {
            let model = model_override
                .map(String::from)
                .or_else(|| std::env::var(ENV_MODEL).ok())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string());

            let base_url = std::env::var(ENV_OPENAI_BASE_URL)
                .unwrap_or_else(|_| OPENAI_BASE_URL.to_string());

            Box::new(OpenAIProvider::new(api_key, model, base_url))
        }
        _ => {
            info!("model credential not set, falling back to echo mode");
            Box::new(EchoProvider::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provider;

    #[test]
    fn test_echo_provider_identity() {
        let provider = EchoProvider::new();
        assert_eq!(provider.model(), "echo");
        assert_eq!(provider.name(), "Echo");
    }

    #[test]
    fn test_openai_provider_identity() {
        let provider = OpenAIProvider::openai("key", "gpt-3.5-turbo");
        assert_eq!(provider.name(), "OpenAI");
        assert_eq!(provider.model(), "gpt-3.5-turbo");
    }
}
