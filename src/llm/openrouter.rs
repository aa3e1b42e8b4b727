// ABOUTME: OpenRouter chat completion provider over the OpenAI wire format
// ABOUTME: One-shot completions with a hard upstream timeout and error mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ChatRequest, ChatResponse, LlmProvider, MessageRole, TokenUsage};
use crate::errors::{AppError, AppResult, ErrorCode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard cap on one upstream round trip
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenRouter provider configuration
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// API base, e.g. `https://openrouter.ai/api/v1`
    pub base_url: String,
    /// Bearer token
    pub api_key: String,
    /// Model used when the request does not override it
    pub default_model: String,
}

/// Chat completion client for OpenRouter
pub struct OpenRouterProvider {
    config: OpenRouterConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl OpenRouterProvider {
    /// Build a provider with its own connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: OpenRouterConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn map_error_status(status: reqwest::StatusCode, body: &str) -> AppError {
        let code = match status.as_u16() {
            401 | 403 => ErrorCode::ExternalServiceError,
            429 | 502 | 503 | 504 => ErrorCode::ExternalServiceUnavailable,
            _ => ErrorCode::ExternalServiceError,
        };
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(|m| m.as_str().map(str::to_owned))
            })
            .unwrap_or_else(|| format!("HTTP {status}"));
        AppError::new(code, format!("LLM provider error: {detail}"))
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn chat(&self, request: ChatRequest) -> AppResult<ChatResponse> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        let wire = WireRequest {
            model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: match m.role {
                        MessageRole::System => "system",
                        MessageRole::User => "user",
                        MessageRole::Assistant => "assistant",
                    },
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&wire)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::new(
                        ErrorCode::ExternalServiceUnavailable,
                        "LLM provider timed out",
                    )
                } else {
                    AppError::new(
                        ErrorCode::ExternalServiceUnavailable,
                        format!("Failed to reach LLM provider: {e}"),
                    )
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_error_status(status, &body));
        }

        let parsed: WireResponse = response.json().await.map_err(|e| {
            AppError::external_service(format!("Malformed LLM provider response: {e}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                AppError::external_service("LLM provider returned no completion choices")
            })?;

        Ok(ChatResponse {
            content,
            model: parsed.model.unwrap_or_else(|| model.to_owned()),
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let unavailable =
            OpenRouterProvider::map_error_status(reqwest::StatusCode::BAD_GATEWAY, "");
        assert_eq!(unavailable.code, ErrorCode::ExternalServiceUnavailable);

        let auth = OpenRouterProvider::map_error_status(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"bad key"}}"#,
        );
        assert_eq!(auth.code, ErrorCode::ExternalServiceError);
        assert!(auth.message.contains("bad key"));
    }

    #[test]
    fn test_wire_request_shape() {
        let wire = WireRequest {
            model: "arcee-ai/trinity-mini:free",
            messages: vec![WireMessage {
                role: "user",
                content: "hello",
            }],
            temperature: None,
            max_tokens: None,
        };
        let value = serde_json::to_value(&wire).unwrap();
        assert_eq!(value["model"], "arcee-ai/trinity-mini:free");
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value.get("temperature").is_none());
    }

    #[test]
    fn test_wire_response_parsing() {
        let raw = r#"{
            "model": "arcee-ai/trinity-mini:free",
            "choices": [{"message": {"role": "assistant", "content": "hi there"}}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
        }"#;
        let parsed: WireResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("hi there")
        );
        assert_eq!(parsed.usage.map(|u| u.total_tokens), Some(8));
    }
}
