// ABOUTME: Session token management for durable and ephemeral principals
// ABOUTME: Mints and validates HS256 JWTs carrying the session principal
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Authentication
//!
//! Sessions are stateless JWTs. The token carries the whole [`Principal`]
//! so request handling never needs a session store lookup; guests work
//! identically to Google users except their history is client-side.

use crate::config::AuthConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{Principal, PrincipalKind};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims for a chat session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Principal id
    pub sub: String,
    /// Display name
    pub name: String,
    /// Identity class, "google" or "guest"
    pub kind: PrincipalKind,
    /// Avatar URL if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch
    pub exp: i64,
}

/// Mints and validates session tokens
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl AuthManager {
    /// Create a manager from the server's auth configuration
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.session_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.session_secret.as_bytes()),
            expiry: Duration::hours(config.session_expiry_hours),
        }
    }

    /// Session lifetime in seconds, for cookie Max-Age
    #[must_use]
    pub fn expiry_secs(&self) -> i64 {
        self.expiry.num_seconds()
    }

    /// Mint a session token for `principal`
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails.
    pub fn mint_token(&self, principal: &Principal) -> AppResult<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: principal.id.clone(),
            name: principal.name.clone(),
            kind: principal.kind,
            photo: principal.photo.clone(),
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to mint session token: {e}")))
    }

    /// Validate a token and recover its principal
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` for expired tokens and `AuthInvalid` for
    /// anything else that fails signature or shape checks.
    pub fn validate_token(&self, token: &str) -> AppResult<Principal> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::auth_expired("Session expired")
                }
                _ => AppError::auth_invalid("Invalid session token"),
            },
        )?;

        let claims = data.claims;
        Ok(Principal {
            id: claims.sub,
            name: claims.name,
            kind: claims.kind,
            photo: claims.photo,
        })
    }
}

/// Mint a fresh guest principal with the display name the user chose
///
/// Guest ids embed the mint time in milliseconds, which keeps them unique
/// per browser session without any storage.
#[must_use]
pub fn new_guest_principal(name: &str) -> Principal {
    Principal {
        id: format!("guest_{}", Utc::now().timestamp_millis()),
        name: name.trim().to_owned(),
        kind: PrincipalKind::Guest,
        photo: None,
    }
}
