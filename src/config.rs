// ABOUTME: Environment-driven server configuration with startup validation
// ABOUTME: Collects HTTP, database, session, OAuth, and LLM boundary settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Server Configuration
//!
//! Environment-only configuration. Every knob is an environment variable;
//! `ServerConfig::from_env()` is the single entry point and `summary()` is
//! logged at startup so a deployment can be audited from its logs.

use crate::errors::{AppError, AppResult};
use std::env;

/// Default HTTP port, matching the development frontend expectations
const DEFAULT_HTTP_PORT: u16 = 3000;

/// Default SQLite database location
const DEFAULT_DATABASE_URL: &str = "sqlite:data.db";

/// Default session lifetime (seven days, the original cookie max-age)
const DEFAULT_SESSION_EXPIRY_HOURS: i64 = 168;

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database connection string
    pub database_url: String,
    /// Session/auth settings
    pub auth: AuthConfig,
    /// Google OAuth settings; `None` disables the Google login route
    pub google: Option<GoogleOAuthConfig>,
    /// LLM boundary settings
    pub llm: LlmConfig,
}

/// Session token settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for session tokens
    pub session_secret: String,
    /// Session token lifetime in hours
    pub session_expiry_hours: i64,
    /// Cookies marked Secure (set behind HTTPS)
    pub secure_cookies: bool,
}

/// Google OAuth web-flow settings
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Redirect URI registered with the provider
    pub redirect_uri: String,
}

/// Upstream LLM settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible chat completions API
    pub base_url: String,
    /// API key; absence is surfaced per request, not at startup
    pub api_key: Option<String>,
    /// Model identifier sent with every request
    pub model: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable fails to parse (e.g. a
    /// non-numeric `PORT`). Missing optional variables fall back to
    /// defaults or disable their feature.
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|e| AppError::config(format!("Invalid PORT value {value:?}: {e}")))?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());

        let session_expiry_hours = match env::var("SESSION_EXPIRY_HOURS") {
            Ok(value) => value.parse::<i64>().map_err(|e| {
                AppError::config(format!("Invalid SESSION_EXPIRY_HOURS {value:?}: {e}"))
            })?,
            Err(_) => DEFAULT_SESSION_EXPIRY_HOURS,
        };

        let auth = AuthConfig {
            session_secret: env::var("SESSION_SECRET")
                .map_err(|_| AppError::config("SESSION_SECRET must be set"))?,
            session_expiry_hours,
            secure_cookies: env::var("ENVIRONMENT").as_deref() == Ok("production")
                || env::var("NODE_ENV").as_deref() == Ok("production"),
        };

        let google = Self::google_from_env();

        let llm = LlmConfig {
            base_url: env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_owned()),
            api_key: env::var("OPENROUTER_API_KEY").ok().filter(|k| !k.is_empty()),
            model: env::var("CHAT_MODEL")
                .unwrap_or_else(|_| "arcee-ai/trinity-mini:free".to_owned()),
        };

        Ok(Self {
            http_port,
            database_url,
            auth,
            google,
            llm,
        })
    }

    /// Google login is enabled only when the full credential triple is present
    fn google_from_env() -> Option<GoogleOAuthConfig> {
        let client_id = env::var("GOOGLE_CLIENT_ID").ok().filter(|v| !v.is_empty())?;
        let client_secret = env::var("GOOGLE_CLIENT_SECRET")
            .ok()
            .filter(|v| !v.is_empty())?;
        let redirect_uri = env::var("GOOGLE_CALLBACK_URL")
            .unwrap_or_else(|_| "http://localhost:3000/auth/google/callback".to_owned());

        Some(GoogleOAuthConfig {
            client_id,
            client_secret,
            redirect_uri,
        })
    }

    /// One-line configuration summary for startup logging (no secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} database={} google_login={} llm_model={} llm_key={}",
            self.http_port,
            self.database_url,
            if self.google.is_some() {
                "enabled"
            } else {
                "disabled"
            },
            self.llm.model,
            if self.llm.api_key.is_some() {
                "configured"
            } else {
                "missing"
            },
        )
    }
}
