// ABOUTME: Login, logout, and session introspection endpoints
// ABOUTME: Google OAuth web flow, guest sessions, and the user info route
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication routes
//!
//! `POST /auth/guest` mints an ephemeral session from a display name.
//! `GET /auth/google` starts the OAuth web flow and its callback finishes
//! it, upserting the profile and setting the session cookie. Failed
//! logins redirect back to the entry page rather than surfacing errors.

use super::ServerResources;
use crate::auth::new_guest_principal;
use crate::database::users::UserRecord;
use crate::errors::AppError;
use crate::models::{Principal, PrincipalKind, SessionInfo};
use crate::oauth::GoogleOAuthClient;
use crate::security;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Guest login request body
#[derive(Debug, Deserialize)]
pub struct GuestLoginRequest {
    /// Display name for the guest session
    pub name: String,
}

/// Query parameters Google appends to the callback redirect
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Authorization code, absent when the user denied consent
    #[serde(default)]
    pub code: Option<String>,
    /// Echo of the state we sent
    #[serde(default)]
    pub state: Option<String>,
}

/// Authentication route group
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/auth/guest", post(Self::guest_login))
            .route("/auth/google", get(Self::google_login))
            .route("/auth/google/callback", get(Self::google_callback))
            .route("/api/user", get(Self::current_user))
            .route("/logout", get(Self::logout))
            .with_state(resources)
    }

    /// Start an ephemeral guest session
    async fn guest_login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<GuestLoginRequest>,
    ) -> Result<Response, AppError> {
        if request.name.trim().is_empty() {
            return Err(AppError::invalid_input("Name required"));
        }

        let principal = new_guest_principal(&request.name);
        info!("Guest session started for {}", principal.id);
        Self::session_response(
            &resources,
            &principal,
            Json(serde_json::json!({ "ok": true })).into_response(),
        )
    }

    /// Redirect the browser to the Google consent screen
    async fn google_login(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let oauth = Self::oauth(&resources)?;
        let state = GoogleOAuthClient::generate_state();
        let auth_url = oauth.authorization_url(&state)?;

        let secure = resources.config.auth.secure_cookies;
        let mut response = Redirect::to(&auth_url).into_response();
        response.headers_mut().append(
            header::SET_COOKIE,
            security::oauth_state_cookie(&state, secure)
                .parse()
                .map_err(|e| AppError::internal(format!("Invalid cookie header: {e}")))?,
        );
        Ok(response)
    }

    /// Finish the OAuth flow, upsert the profile, and start the session
    async fn google_callback(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(params): Query<CallbackParams>,
    ) -> Result<Response, AppError> {
        let oauth = Self::oauth(&resources)?;

        let expected_state = security::get_cookie_value(&headers, security::OAUTH_STATE_COOKIE);
        let state_ok = matches!((&params.state, &expected_state), (Some(got), Some(want)) if got == want);
        let Some(code) = params.code.filter(|_| state_ok) else {
            warn!("Google callback rejected: missing code or state mismatch");
            return Self::redirect_with_cleared_state(&resources, "/index.html");
        };

        let profile = match oauth.exchange_code(&code).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Google code exchange failed: {e}");
                return Self::redirect_with_cleared_state(&resources, "/index.html");
            }
        };

        let record = UserRecord {
            id: profile.id.clone(),
            name: profile.name.clone().unwrap_or_else(|| "User".to_owned()),
            email: profile.email.clone(),
            photo: profile.picture.clone(),
        };
        resources.database.users().upsert_user(&record).await?;

        let principal = Principal {
            id: record.id,
            name: record.name,
            kind: PrincipalKind::Google,
            photo: record.photo,
        };
        info!("Google login completed for {}", principal.id);

        let mut response =
            Self::session_response(&resources, &principal, Redirect::to("/chat.html").into_response())?;
        response.headers_mut().append(
            header::SET_COOKIE,
            security::clear_oauth_state_cookie(resources.config.auth.secure_cookies)
                .parse()
                .map_err(|e| AppError::internal(format!("Invalid cookie header: {e}")))?,
        );
        Ok(response)
    }

    /// Session introspection for the client shell
    async fn current_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Json<SessionInfo> {
        match resources.authenticate(&headers) {
            Ok(principal) => Json(SessionInfo::for_principal(principal)),
            Err(_) => Json(SessionInfo::anonymous()),
        }
    }

    /// Drop the session cookie and return to the entry page
    async fn logout(State(resources): State<Arc<ServerResources>>) -> Result<Response, AppError> {
        let mut response = Redirect::to("/index.html").into_response();
        response.headers_mut().append(
            header::SET_COOKIE,
            security::clear_session_cookie(resources.config.auth.secure_cookies)
                .parse()
                .map_err(|e| AppError::internal(format!("Invalid cookie header: {e}")))?,
        );
        Ok(response)
    }

    fn oauth(resources: &Arc<ServerResources>) -> Result<&GoogleOAuthClient, AppError> {
        resources
            .oauth
            .as_ref()
            .ok_or_else(|| AppError::config("Google login is not configured"))
    }

    /// Attach a freshly minted session cookie to `response`
    fn session_response(
        resources: &Arc<ServerResources>,
        principal: &Principal,
        mut response: Response,
    ) -> Result<Response, AppError> {
        let token = resources.auth.mint_token(principal)?;
        let cookie = security::session_cookie(
            &token,
            resources.auth.expiry_secs(),
            resources.config.auth.secure_cookies,
        );
        response.headers_mut().append(
            header::SET_COOKIE,
            cookie
                .parse()
                .map_err(|e| AppError::internal(format!("Invalid cookie header: {e}")))?,
        );
        Ok(response)
    }

    fn redirect_with_cleared_state(
        resources: &Arc<ServerResources>,
        location: &str,
    ) -> Result<Response, AppError> {
        let mut response = Redirect::to(location).into_response();
        response.headers_mut().append(
            header::SET_COOKIE,
            security::clear_oauth_state_cookie(resources.config.auth.secure_cookies)
                .parse()
                .map_err(|e| AppError::internal(format!("Invalid cookie header: {e}")))?,
        );
        Ok(response)
    }
}
