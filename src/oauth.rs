// ABOUTME: Google OAuth 2.0 web flow client for durable sign-in
// ABOUTME: Builds consent URLs, exchanges codes, and fetches the profile
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Google OAuth
//!
//! Classic server-side web flow. The server redirects the browser to the
//! consent screen with a random `state`, Google redirects back with a
//! `code`, and we exchange it for an access token to read the profile.
//! No PKCE; the client secret authenticates the exchange.

use crate::config::GoogleOAuthConfig;
use crate::errors::{AppError, AppResult};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Profile fields returned by Google's userinfo endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// Stable subject id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google OAuth web-flow client
pub struct GoogleOAuthClient {
    config: GoogleOAuthConfig,
    client: reqwest::Client,
}

impl GoogleOAuthClient {
    /// Build a client for the configured credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: GoogleOAuthConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Random CSRF state for one login attempt
    #[must_use]
    pub fn generate_state() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    }

    /// Consent-screen URL carrying `state`
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint constant fails to parse, which
    /// indicates a build defect rather than a runtime condition.
    pub fn authorization_url(&self, state: &str) -> AppResult<String> {
        let mut url = Url::parse(AUTH_ENDPOINT)
            .map_err(|e| AppError::internal(format!("Invalid authorization endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("state", state);
        Ok(url.into())
    }

    /// Exchange an authorization code for the user's profile
    ///
    /// # Errors
    ///
    /// Returns an external-service error if the token exchange or the
    /// profile fetch fails.
    pub async fn exchange_code(&self, code: &str) -> AppResult<GoogleProfile> {
        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("Token exchange failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::external_service(format!(
                "Token exchange rejected with HTTP {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::external_service(format!("Malformed token response: {e}")))?;

        self.fetch_profile(&token.access_token).await
    }

    async fn fetch_profile(&self, access_token: &str) -> AppResult<GoogleProfile> {
        let response = self
            .client
            .get(USERINFO_ENDPOINT)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("Profile fetch failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::external_service(format!(
                "Profile fetch rejected with HTTP {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::external_service(format!("Malformed profile response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GoogleOAuthClient {
        GoogleOAuthClient::new(GoogleOAuthConfig {
            client_id: "client-123".into(),
            client_secret: "secret".into(),
            redirect_uri: "http://localhost:3000/auth/google/callback".into(),
        })
        .unwrap()
    }

    #[test]
    fn test_authorization_url_carries_state() {
        let url = test_client().authorization_url("state-abc").unwrap();
        let parsed = Url::parse(&url).unwrap();

        let pairs: std::collections::HashMap<_, _> = parsed.query_pairs().collect();
        assert_eq!(pairs.get("client_id").map(AsRef::as_ref), Some("client-123"));
        assert_eq!(pairs.get("response_type").map(AsRef::as_ref), Some("code"));
        assert_eq!(pairs.get("state").map(AsRef::as_ref), Some("state-abc"));
        assert_eq!(
            pairs.get("scope").map(AsRef::as_ref),
            Some("openid email profile")
        );
    }

    #[test]
    fn test_state_is_random_and_url_safe() {
        let a = GoogleOAuthClient::generate_state();
        let b = GoogleOAuthClient::generate_state();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
