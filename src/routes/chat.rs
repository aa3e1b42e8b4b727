// ABOUTME: The chat exchange endpoint bridging clients to the LLM provider
// ABOUTME: Validates input, runs one completion, persists durable history
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat route
//!
//! `POST /api/chat` takes `{question}` and returns `{result}` with the raw
//! model answer. Formatting happens client-side at render time, so stored
//! answers survive formatter changes. Only Google-backed principals get
//! their exchange persisted; guest history never reaches the server.

use super::ServerResources;
use crate::errors::AppError;
use crate::llm::{ChatMessage, ChatRequest};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Chat exchange request body
#[derive(Debug, Deserialize)]
pub struct ChatExchangeRequest {
    /// The user's question, raw text
    pub question: String,
}

/// Chat exchange response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatExchangeResponse {
    /// The model's answer, raw and unformatted
    pub result: String,
}

/// Chat route group
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create the chat route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat", post(Self::exchange))
            .with_state(resources)
    }

    /// Run one question/answer exchange
    async fn exchange(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ChatExchangeRequest>,
    ) -> Result<Json<ChatExchangeResponse>, AppError> {
        let principal = resources.authenticate(&headers)?;

        let question = request.question.trim();
        if question.is_empty() {
            return Err(AppError::invalid_input("Question required"));
        }

        let Some(llm) = resources.llm.as_ref() else {
            return Err(AppError::config("Server API key not configured."));
        };

        let chat_request = ChatRequest::new(vec![ChatMessage::user(question)])
            .with_model(resources.config.llm.model.clone());

        let response = llm.chat(chat_request).await.map_err(|e| {
            warn!("Upstream LLM request failed: {e}");
            e
        })?;

        if principal.is_durable() {
            resources
                .database
                .history()
                .record_exchange(&principal.id, question, &response.content)
                .await?;
        }

        info!(
            user = %principal.id,
            model = %response.model,
            tokens = response.usage.map_or(0, |u| u.total_tokens),
            "Chat exchange completed"
        );

        Ok(Json(ChatExchangeResponse {
            result: response.content,
        }))
    }
}
