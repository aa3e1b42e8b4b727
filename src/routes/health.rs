// ABOUTME: Liveness endpoint reporting service status and configuration
// ABOUTME: Unauthenticated, used by deploy checks and uptime monitors
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::ServerResources;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

/// Health route group
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::health))
            .with_state(resources)
    }

    async fn health(State(resources): State<Arc<ServerResources>>) -> Json<serde_json::Value> {
        let database_ok = sqlx::query("SELECT 1")
            .execute(resources.database.pool())
            .await
            .is_ok();

        Json(serde_json::json!({
            "status": if database_ok { "ok" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "database": database_ok,
            "llm_configured": resources.llm.is_some(),
            "google_login": resources.oauth.is_some(),
        }))
    }
}
