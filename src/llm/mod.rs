// ABOUTME: Provider-agnostic LLM chat types and the provider trait
// ABOUTME: Request/response shapes shared by every chat completion backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # LLM Provider Interface
//!
//! A small SPI over OpenAI-compatible chat completion APIs. The server
//! only ever needs one-shot completions, so there is no streaming
//! surface here.

use crate::errors::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod openrouter;

pub use openrouter::OpenRouterProvider;

/// Role of a chat message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction
    System,
    /// End-user message
    User,
    /// Model reply
    Assistant,
}

impl MessageRole {
    /// Wire string for the role
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a chat exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message author role
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// A user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// A system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// A chat completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Conversation so far, oldest first
    pub messages: Vec<ChatMessage>,
    /// Model override; the provider default applies when `None`
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Completion token cap
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Request containing just `messages`
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Override the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap completion tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
    /// Prompt plus completion
    pub total_tokens: u32,
}

/// A chat completion response
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The assistant's reply text
    pub content: String,
    /// Model that produced the reply
    pub model: String,
    /// Token usage, when the provider reported it
    pub usage: Option<TokenUsage>,
}

/// A chat completion backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Execute one chat completion
    async fn chat(&self, request: ChatRequest) -> AppResult<ChatResponse>;
}
