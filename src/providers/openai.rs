// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! OpenAI-compatible provider implementation.
//!
//! A minimal [`Provider`] for the Chat Completions API. Works with OpenAI
//! and any OpenAI-compatible endpoint via a custom base URL.
//!
//! # API Reference
//!
//! See [OpenAI Chat Completions API](https://platform.openai.com/docs/api-reference/chat)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use tracing::debug;

use crate::error::ProviderError;
use crate::types::{Message, Provider, ProviderResponse, Role, TokenUsage};

/// Default OpenAI API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model for the chat node.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// OpenAI-compatible provider.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
            temperature: 0.0,
        }
    }

    /// Create a provider against the default OpenAI endpoint.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(api_key, model, OPENAI_BASE_URL)
    }

    /// Build the request body for the Chat Completions API.
    fn build_request(&self, messages: &[Message]) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            temperature: Some(self.temperature),
        }
    }

    /// Map an error response body to a typed provider error.
    fn handle_error_response(&self, status_code: u16, body: &str) -> ProviderError {
        if let Ok(error) = serde_json::from_str::<ApiError>(body) {
            let message = error.error.message;
            match error.error.error_type.as_deref() {
                Some("authentication_error") | Some("invalid_api_key") => {
                    ProviderError::AuthError(message)
                }
                Some("rate_limit_error") | Some("rate_limit_exceeded") => {
                    ProviderError::RateLimited(message)
                }
                Some("model_not_found") => ProviderError::ModelNotFound(message),
                _ => ProviderError::api(message, status_code),
            }
        } else {
            ProviderError::api(body.to_string(), status_code)
        }
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    async fn chat(&self, messages: &[Message]) -> Result<ProviderResponse, ProviderError> {
        let request = self.build_request(messages);

        debug!(model = %self.model, messages = messages.len(), "Sending chat request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(self.handle_error_response(status.as_u16(), &error_text));
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        api_response.try_into()
    }

    fn name(&self) -> &str {
        "OpenAI"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// API Types
// ============================================================================

/// Request body for the Chat Completions API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Chat message wire format.
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };

        Self {
            role: role.to_string(),
            content: msg.content.clone(),
        }
    }
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Token usage wire format.
#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl TryFrom<ChatResponse> for ProviderResponse {
    type Error = ProviderError;

    fn try_from(response: ChatResponse) -> Result<Self, Self::Error> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ParseError("response contained no choices".to_string()))?;

        let usage = response.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(ProviderResponse {
            content: choice.message.content,
            usage,
        })
    }
}

/// API error response.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request() {
        let provider = OpenAIProvider::openai("test-key", DEFAULT_MODEL);
        let messages = vec![Message::system("be brief"), Message::user("hi")];

        let request = provider.build_request(&messages);
        assert_eq!(request.model, DEFAULT_MODEL);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.temperature, Some(0.0));
    }

    #[test]
    fn test_handle_error_response_auth() {
        let provider = OpenAIProvider::openai("bad-key", DEFAULT_MODEL);
        let body = r#"{"error":{"message":"Incorrect API key","type":"invalid_api_key"}}"#;

        let err = provider.handle_error_response(401, body);
        assert!(matches!(err, ProviderError::AuthError(_)));
    }

    #[test]
    fn test_handle_error_response_rate_limit() {
        let provider = OpenAIProvider::openai("key", DEFAULT_MODEL);
        let body = r#"{"error":{"message":"Slow down","type":"rate_limit_exceeded"}}"#;

        let err = provider.handle_error_response(429, body);
        assert!(matches!(err, ProviderError::RateLimited(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_handle_error_response_unparseable() {
        let provider = OpenAIProvider::openai("key", DEFAULT_MODEL);

        let err = provider.handle_error_response(500, "Internal Server Error");
        match err {
            ProviderError::ApiError { status_code, .. } => {
                assert_eq!(status_code, Some(500));
            }
            _ => panic!("Expected ApiError"),
        }
    }

    #[test]
    fn test_response_conversion() {
        let response = ChatResponse {
            choices: vec![ChatChoice {
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content: "Hello!".to_string(),
                },
            }],
            usage: Some(ChatUsage {
                prompt_tokens: 10,
                completion_tokens: 2,
            }),
        };

        let converted: ProviderResponse = response.try_into().unwrap();
        assert_eq!(converted.content, "Hello!");
        assert_eq!(converted.usage.unwrap().total(), 12);
    }

    #[test]
    fn test_empty_choices_is_parse_error() {
        let response = ChatResponse {
            choices: vec![],
            usage: None,
        };

        let result: Result<ProviderResponse, _> = response.try_into();
        assert!(matches!(result, Err(ProviderError::ParseError(_))));
    }
}
