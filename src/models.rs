// ABOUTME: Core domain types shared across routes, auth, and storage
// ABOUTME: Principals, session payloads, and chat history records
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Domain Models
//!
//! Shared data types. A [`Principal`] is whoever is holding the session,
//! durable (Google-backed) or ephemeral (guest). History records live here
//! because both the database layer and the routes exchange them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a principal was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    /// Durable identity backed by a Google account
    Google,
    /// Ephemeral identity minted locally, no external verification
    Guest,
}

impl PrincipalKind {
    /// Wire string used in session payloads and the user endpoint
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Guest => "guest",
        }
    }
}

/// An authenticated (or self-declared guest) session holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identifier; provider subject for Google, `guest_<millis>` for guests
    pub id: String,
    /// Display name
    pub name: String,
    /// Identity class
    #[serde(rename = "type")]
    pub kind: PrincipalKind,
    /// Avatar URL when the provider supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl Principal {
    /// Durable principals persist history server-side
    #[must_use]
    pub const fn is_durable(&self) -> bool {
        matches!(self.kind, PrincipalKind::Google)
    }
}

/// Response body of the session introspection endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Whether a valid session was presented
    #[serde(rename = "loggedIn")]
    pub logged_in: bool,
    /// The session principal, absent when logged out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Principal>,
}

impl SessionInfo {
    /// An anonymous, logged-out session
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            logged_in: false,
            user: None,
        }
    }

    /// A session bound to `principal`
    #[must_use]
    pub const fn for_principal(principal: Principal) -> Self {
        Self {
            logged_in: true,
            user: Some(principal),
        }
    }
}

/// One stored question/answer exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The user's question, verbatim
    pub question: String,
    /// The assistant's raw (unformatted) answer
    pub answer: String,
    /// When the exchange was recorded
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_kind_wire_strings() {
        assert_eq!(PrincipalKind::Google.as_str(), "google");
        assert_eq!(PrincipalKind::Guest.as_str(), "guest");

        let json = serde_json::to_string(&PrincipalKind::Guest).unwrap();
        assert_eq!(json, "\"guest\"");
    }

    #[test]
    fn test_principal_serializes_kind_as_type() {
        let principal = Principal {
            id: "guest_1700000000000".into(),
            name: "Guest".into(),
            kind: PrincipalKind::Guest,
            photo: None,
        };

        let value = serde_json::to_value(&principal).unwrap();
        assert_eq!(value["type"], "guest");
        assert!(value.get("photo").is_none());
    }

    #[test]
    fn test_session_info_shapes() {
        let anon = serde_json::to_value(SessionInfo::anonymous()).unwrap();
        assert_eq!(anon["loggedIn"], false);
        assert!(anon.get("user").is_none());

        let principal = Principal {
            id: "108234".into(),
            name: "Ada".into(),
            kind: PrincipalKind::Google,
            photo: Some("https://example.com/a.png".into()),
        };
        let session = serde_json::to_value(SessionInfo::for_principal(principal)).unwrap();
        assert_eq!(session["loggedIn"], true);
        assert_eq!(session["user"]["type"], "google");
    }
}
