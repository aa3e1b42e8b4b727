// ABOUTME: HTTP cookie helpers for session and OAuth state transport
// ABOUTME: Parses Cookie headers and builds hardened Set-Cookie values
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Cookie Security
//!
//! Session tokens travel in the `auth_token` cookie; the OAuth login flow
//! parks its CSRF state in a short-lived `oauth_state` cookie. Both are
//! HttpOnly with SameSite=Lax, Secure in production.

use axum::http::HeaderMap;

/// Session token cookie name
pub const AUTH_COOKIE: &str = "auth_token";

/// OAuth CSRF state cookie name
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// OAuth state cookie lifetime in seconds (ten minutes)
const OAUTH_STATE_MAX_AGE: i64 = 600;

/// Extract a named cookie value from request headers
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for cookie in cookie_header.split(';') {
        let cookie = cookie.trim();
        if let Some((key, value)) = cookie.split_once('=') {
            if key == name {
                return Some(value.to_owned());
            }
        }
    }
    None
}

/// Build the session Set-Cookie value
///
/// HttpOnly keeps the token out of script reach; SameSite=Lax still allows
/// the OAuth redirect to carry the cookie back.
#[must_use]
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!(
        "{AUTH_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}{secure_attr}"
    )
}

/// Build a Set-Cookie value that clears the session cookie
#[must_use]
pub fn clear_session_cookie(secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!("{AUTH_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0{secure_attr}")
}

/// Build the OAuth state Set-Cookie value
#[must_use]
pub fn oauth_state_cookie(state: &str, secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!(
        "{OAUTH_STATE_COOKIE}={state}; HttpOnly; Path=/; SameSite=Lax; Max-Age={OAUTH_STATE_MAX_AGE}{secure_attr}"
    )
}

/// Build a Set-Cookie value that clears the OAuth state cookie
#[must_use]
pub fn clear_oauth_state_cookie(secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!("{OAUTH_STATE_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0{secure_attr}")
}
