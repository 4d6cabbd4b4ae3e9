// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Echo-mode provider: the degraded no-credential fallback.
//!
//! When no model credential is configured, the agent still answers: the
//! echo provider returns a deterministic transformation of the most recent
//! message instead of a real model response. This is a degradation mode,
//! not an error; invocations through it succeed and are traced normally.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{Message, Provider, ProviderResponse};

/// Prefix attached to every echo response.
pub const ECHO_PREFIX: &str = "Echo: ";

/// Deterministic echo provider.
pub struct EchoProvider;

impl EchoProvider {
    /// Create a new echo provider.
    pub fn new() -> Self {
        Self
    }
}

impl Default for EchoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for EchoProvider {
    async fn chat(&self, messages: &[Message]) -> Result<ProviderResponse, ProviderError> {
        let content = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        Ok(ProviderResponse::text(format!("{}{}", ECHO_PREFIX, content)))
    }

    fn name(&self) -> &str {
        "Echo"
    }

    fn model(&self) -> &str {
        "echo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_is_deterministic() {
        let provider = EchoProvider::new();
        let messages = vec![Message::user("Hello, world!")];

        let first = provider.chat(&messages).await.unwrap();
        let second = provider.chat(&messages).await.unwrap();

        assert_eq!(first.content, "Echo: Hello, world!");
        assert_eq!(first.content, second.content);
    }

    #[tokio::test]
    async fn test_echo_uses_most_recent_message() {
        let provider = EchoProvider::new();
        let messages = vec![Message::user("first"), Message::user("second")];

        let response = provider.chat(&messages).await.unwrap();
        assert_eq!(response.content, "Echo: second");
    }

    #[tokio::test]
    async fn test_echo_empty_conversation() {
        let provider = EchoProvider::new();

        let response = provider.chat(&[]).await.unwrap();
        assert_eq!(response.content, "Echo: ");
    }
}
