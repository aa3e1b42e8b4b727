// ABOUTME: HTTP route modules and the shared server resource container
// ABOUTME: Assembles the axum router with tracing and CORS layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # HTTP Routes
//!
//! Each route group is a unit struct with a `routes(Arc<ServerResources>)`
//! constructor returning its own `Router`; [`build_router`] merges them
//! and attaches the middleware layers.

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::llm::LlmProvider;
use crate::models::Principal;
use crate::oauth::GoogleOAuthClient;
use crate::security;
use axum::http::HeaderMap;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod chat;
pub mod health;
pub mod history;

pub use auth::AuthRoutes;
pub use chat::ChatRoutes;
pub use health::HealthRoutes;
pub use history::HistoryRoutes;

/// Everything a request handler can reach, shared across all routes
pub struct ServerResources {
    /// Persistence layer
    pub database: Database,
    /// Session token manager
    pub auth: AuthManager,
    /// Chat completion backend; `None` when no API key is configured
    pub llm: Option<Arc<dyn LlmProvider>>,
    /// Google OAuth client; `None` when credentials are not configured
    pub oauth: Option<GoogleOAuthClient>,
    /// Startup configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Authenticate a request from its `Authorization` header or the
    /// `auth_token` cookie
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when neither carrier is present and the
    /// token validation error otherwise.
    pub fn authenticate(&self, headers: &HeaderMap) -> AppResult<Principal> {
        let token = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_owned)
            .or_else(|| security::get_cookie_value(headers, security::AUTH_COOKIE))
            .ok_or_else(|| AppError::auth_required("Not authenticated"))?;

        self.auth.validate_token(&token)
    }
}

/// Assemble the full application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(ChatRoutes::routes(resources.clone()))
        .merge(HistoryRoutes::routes(resources.clone()))
        .merge(HealthRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
