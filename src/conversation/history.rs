// ABOUTME: Dual-mode history store routed by principal kind
// ABOUTME: Browser-local dedup list for guests, server fetch view for accounts
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History routing. Durable principals read and clear history on the
//! server; ephemeral principals keep a local dedup list that can never
//! fail. Both present newest-first.

use crate::models::{Principal, PrincipalKind};

/// Client-local question log for ephemeral principals
///
/// Appends deduplicate exact question text. The list is kept oldest-first
/// internally; [`LocalHistory::list`] reverses so rendering is newest-first
/// like the server view.
#[derive(Debug, Default, Clone)]
pub struct LocalHistory {
    questions: Vec<String>,
}

impl LocalHistory {
    /// Empty history
    #[must_use]
    pub const fn new() -> Self {
        Self {
            questions: Vec::new(),
        }
    }

    /// Restore from a previously persisted question list, oldest first
    #[must_use]
    pub const fn from_saved(questions: Vec<String>) -> Self {
        Self { questions }
    }

    /// Append a question unless identical text is already stored
    ///
    /// Returns whether the question was newly added, so the caller knows
    /// whether to persist and render it.
    pub fn append(&mut self, question: &str) -> bool {
        if self.questions.iter().any(|q| q == question) {
            return false;
        }
        self.questions.push(question.to_owned());
        true
    }

    /// Questions newest-first
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.questions.iter().rev().map(String::as_str).collect()
    }

    /// Oldest-first backing list, the shape that gets persisted
    #[must_use]
    pub fn saved(&self) -> &[String] {
        &self.questions
    }

    /// Drop everything, cannot fail
    pub fn clear(&mut self) {
        self.questions.clear();
    }

    /// Number of stored questions
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Which backend serves history for the current principal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryBackend {
    /// Server store keyed by account id
    Server,
    /// Browser-local list, one per origin
    Local,
}

impl HistoryBackend {
    /// Routing decision, fixed for the session by principal kind
    #[must_use]
    pub const fn for_principal(principal: &Principal) -> Self {
        match principal.kind {
            PrincipalKind::Google => Self::Server,
            PrincipalKind::Guest => Self::Local,
        }
    }
}
