// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent module - the span-wrapped unit-of-work handler.
//!
//! [`ChatNode`] is the single entry point the hosting framework invokes: it
//! takes a conversation state, calls the model provider once, and returns
//! the state with exactly one appended assistant message.
//!
//! Observability is strictly additive here. When tracing is active each
//! invocation is wrapped in a `chat.invoke_model` span with success/error
//! attributes recorded on every exit path; when it is not, the provider is
//! called directly with no tracing overhead. The monitoring hook observes
//! the call either way. Neither path ever changes the functional outcome,
//! and a provider failure propagates to the caller unchanged.
//!
//! # Example
//!
//! ```rust,ignore
//! use chatspan::agent::ChatNode;
//! use chatspan::providers::create_provider_from_env;
//! use chatspan::types::ChatState;
//!
//! let node = ChatNode::with_provider(create_provider_from_env(None));
//! let state = node.invoke(ChatState::from_user("Hello!")).await?;
//! println!("{}", state.last().unwrap().content);
//! ```

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::error::ProviderError;
use crate::monitor::{InstrumentHook, NoopHook};
use crate::telemetry::{InvocationSpan, TracingState, MODEL_INVOKE_SPAN};
use crate::types::{BoxedProvider, ChatState, Message};

/// The unit-of-work handler: one model call per invocation.
pub struct ChatNode {
    /// Model provider (real backend or echo fallback).
    provider: BoxedProvider,
    /// Whether to wrap invocations in exported spans.
    tracing: TracingState,
    /// Monitoring hook observing each call.
    hook: Arc<dyn InstrumentHook>,
}

impl ChatNode {
    /// Create a node with explicit tracing state and monitoring hook.
    pub fn new(
        provider: BoxedProvider,
        tracing: TracingState,
        hook: Arc<dyn InstrumentHook>,
    ) -> Self {
        Self {
            provider,
            tracing,
            hook,
        }
    }

    /// Create a node with observability disabled.
    pub fn with_provider(provider: BoxedProvider) -> Self {
        Self::new(provider, TracingState::disabled(), Arc::new(NoopHook))
    }

    /// The model the node will invoke.
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Handle one unit of work.
    ///
    /// Returns the conversation with one appended assistant message, or the
    /// provider's error unchanged. Every invocation is observed by the
    /// monitoring hook, and traced as a single span when tracing is active.
    pub async fn invoke(&self, state: ChatState) -> Result<ChatState, ProviderError> {
        self.hook.transaction_started(MODEL_INVOKE_SPAN);

        let result = if self.tracing.is_active() {
            let guard = InvocationSpan::start(self.provider.model());
            let span = guard.span().clone();
            let result = self.call_model(state).instrument(span).await;
            guard.finish_with_result(&result);
            result
        } else {
            self.call_model(state).await
        };

        self.hook
            .transaction_finished(MODEL_INVOKE_SPAN, result.is_ok());
        result
    }

    async fn call_model(&self, mut state: ChatState) -> Result<ChatState, ProviderError> {
        let start = Instant::now();

        match self.provider.chat(state.messages()).await {
            Ok(response) => {
                self.hook
                    .record_llm_call(self.provider.model(), start.elapsed(), true);
                state.push(Message::assistant(response.content));
                Ok(state)
            }
            Err(e) => {
                self.hook
                    .record_llm_call(self.provider.model(), start.elapsed(), false);
                self.hook.notice_error(&e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::EchoProvider;
    use crate::types::Role;

    #[tokio::test]
    async fn test_invoke_appends_one_assistant_message() {
        let node = ChatNode::with_provider(Box::new(EchoProvider::new()));
        let state = node.invoke(ChatState::from_user("hi")).await.unwrap();

        assert_eq!(state.len(), 2);
        let last = state.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "Echo: hi");
    }

    #[tokio::test]
    async fn test_invoke_with_active_tracing_same_output() {
        // Tracing must not alter the functional outcome.
        let plain = ChatNode::with_provider(Box::new(EchoProvider::new()));
        let traced = ChatNode::new(
            Box::new(EchoProvider::new()),
            TracingState::active("chatspan-test"),
            Arc::new(NoopHook),
        );

        let input = ChatState::from_user("Hello, world!");
        let a = plain.invoke(input.clone()).await.unwrap();
        let b = traced.invoke(input).await.unwrap();

        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_node_model_name() {
        let node = ChatNode::with_provider(Box::new(EchoProvider::new()));
        assert_eq!(node.model(), "echo");
    }
}
