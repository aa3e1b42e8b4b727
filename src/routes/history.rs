// ABOUTME: Server-side history endpoints for durable principals
// ABOUTME: Newest-first fetch and confirmed delete-all, guests get an empty view
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History routes
//!
//! `GET /api/history` returns `{history: [...]}` newest-first. Guests get
//! an empty list, their log is browser-local. `DELETE /api/clear-history`
//! removes everything for the account and is rejected for guests, whose
//! clear never needs a server round trip.

use super::ServerResources;
use crate::errors::AppError;
use crate::models::HistoryEntry;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// History fetch response body
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Exchanges newest-first; empty for ephemeral principals
    pub history: Vec<HistoryEntry>,
}

/// History clear response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearHistoryResponse {
    /// Always true on success
    pub ok: bool,
}

/// History route group
pub struct HistoryRoutes;

impl HistoryRoutes {
    /// Create the history routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/history", get(Self::list))
            .route("/api/clear-history", delete(Self::clear))
            .with_state(resources)
    }

    /// Fetch stored history for the session principal
    async fn list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<HistoryResponse>, AppError> {
        let principal = resources.authenticate(&headers)?;

        if !principal.is_durable() {
            return Ok(Json(HistoryResponse { history: vec![] }));
        }

        let history = resources
            .database
            .history()
            .list_history(&principal.id)
            .await?;
        Ok(Json(HistoryResponse { history }))
    }

    /// Delete all stored history for the session principal
    async fn clear(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<ClearHistoryResponse>, AppError> {
        let principal = resources.authenticate(&headers)?;

        if !principal.is_durable() {
            return Err(AppError::auth_required("Not authenticated"));
        }

        let removed = resources
            .database
            .history()
            .clear_history(&principal.id)
            .await?;
        info!(user = %principal.id, removed, "History cleared");

        Ok(Json(ClearHistoryResponse { ok: true }))
    }
}
