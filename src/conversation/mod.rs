// ABOUTME: Conversation turn-taking state machine and session context
// ABOUTME: One in-flight question at a time, correlated by monotonic turn ids
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Conversation Controller
//!
//! The view layer feeds user actions in as commands and network
//! completions back in as events; the controller owns all mutable
//! session state (current principal, turn counter, in-flight guard,
//! speaking flag) so nothing lives in free-floating globals.
//!
//! One turn at a time. A question submitted while another is awaiting
//! its answer is rejected outright, and answers are matched back to
//! their placeholder by turn id, so a failure can never overwrite a
//! different turn's content.

use crate::formatters::{clean_for_speech, format_response};
use crate::models::Principal;

pub mod history;

pub use history::{HistoryBackend, LocalHistory};

/// Shown in place of the answer when an exchange fails
pub const FAILURE_MESSAGE: &str = "Something went wrong. Check your connection.";

/// Monotonic per-session turn identifier, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(u64);

/// What a turn's answer slot currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnDisplay {
    /// Loading placeholder
    Pending,
    /// Formatted answer markup plus the raw text for speech playback
    Answered {
        /// Untransformed model output
        raw: String,
        /// Display markup from the formatter
        markup: String,
    },
    /// Terminal failure, the fixed message
    Failed,
}

/// One visible question/answer pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Correlation id assigned at submission
    pub id: TurnId,
    /// The question as typed
    pub question: String,
    /// Current answer slot content
    pub display: TurnDisplay,
}

/// Result of submitting a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Question accepted, request for this turn should be issued
    Accepted(TurnId),
    /// Empty input, silently ignored
    IgnoredEmpty,
    /// Another turn is awaiting its answer
    Busy,
}

/// What the speech toggle decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechAction {
    /// Start speaking this cleaned text
    Speak(String),
    /// Currently speaking, stop and start nothing
    Stop,
    /// Nothing speakable, stay silent
    Silent,
}

/// Session-scoped conversation state
pub struct ConversationController {
    principal: Principal,
    turns: Vec<Turn>,
    next_turn: u64,
    in_flight: Option<TurnId>,
    local_history: LocalHistory,
    history_stale: bool,
    speaking: bool,
}

impl ConversationController {
    /// Fresh conversation for `principal`
    #[must_use]
    pub const fn new(principal: Principal) -> Self {
        Self {
            principal,
            turns: Vec::new(),
            next_turn: 0,
            in_flight: None,
            local_history: LocalHistory::new(),
            history_stale: false,
            speaking: false,
        }
    }

    /// Restore a guest's saved question list into the local history
    pub fn restore_local_history(&mut self, saved: Vec<String>) {
        self.local_history = LocalHistory::from_saved(saved);
    }

    /// The session principal
    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Which backend serves this session's history
    #[must_use]
    pub const fn history_backend(&self) -> HistoryBackend {
        HistoryBackend::for_principal(&self.principal)
    }

    /// All turns, oldest first
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Local question list, newest first
    #[must_use]
    pub fn local_history(&self) -> &LocalHistory {
        &self.local_history
    }

    /// Whether a turn is awaiting its answer
    #[must_use]
    pub const fn is_awaiting_answer(&self) -> bool {
        self.in_flight.is_some()
    }

    /// A durable-mode history view must re-fetch after a successful
    /// exchange instead of patching incrementally
    #[must_use]
    pub const fn history_is_stale(&self) -> bool {
        self.history_stale
    }

    /// Mark the server history view fresh after a re-fetch
    pub fn mark_history_fresh(&mut self) {
        self.history_stale = false;
    }

    /// Submit a question, creating a pending turn when accepted
    pub fn submit(&mut self, question: &str) -> SubmitOutcome {
        let question = question.trim();
        if question.is_empty() {
            return SubmitOutcome::IgnoredEmpty;
        }
        if self.in_flight.is_some() {
            return SubmitOutcome::Busy;
        }

        let id = TurnId(self.next_turn);
        self.next_turn += 1;
        self.turns.push(Turn {
            id,
            question: question.to_owned(),
            display: TurnDisplay::Pending,
        });
        self.in_flight = Some(id);
        SubmitOutcome::Accepted(id)
    }

    /// Answer arrived for `id`; formats it and records history
    ///
    /// Completions for unknown or already-settled turns are ignored, the
    /// guard only clears when the in-flight turn itself settles.
    pub fn resolve(&mut self, id: TurnId, raw_answer: &str) {
        let Some(turn) = self
            .turns
            .iter_mut()
            .find(|t| t.id == id && t.display == TurnDisplay::Pending)
        else {
            return;
        };

        turn.display = TurnDisplay::Answered {
            raw: raw_answer.to_owned(),
            markup: format_response(raw_answer),
        };
        let question = turn.question.clone();

        if self.in_flight == Some(id) {
            self.in_flight = None;
        }

        match self.history_backend() {
            HistoryBackend::Server => self.history_stale = true,
            HistoryBackend::Local => {
                self.local_history.append(&question);
            }
        }
    }

    /// The exchange for `id` failed; show the fixed failure message
    ///
    /// Only that turn's placeholder is replaced. History is not touched.
    pub fn fail(&mut self, id: TurnId) {
        let Some(turn) = self
            .turns
            .iter_mut()
            .find(|t| t.id == id && t.display == TurnDisplay::Pending)
        else {
            return;
        };
        turn.display = TurnDisplay::Failed;

        if self.in_flight == Some(id) {
            self.in_flight = None;
        }
    }

    /// Toggle speech playback for `raw_answer`
    ///
    /// Speaking is a single global resource; toggling while speaking
    /// stops without starting a new utterance.
    pub fn toggle_speech(&mut self, raw_answer: &str) -> SpeechAction {
        if self.speaking {
            self.speaking = false;
            return SpeechAction::Stop;
        }

        let cleaned = clean_for_speech(raw_answer);
        if cleaned.is_empty() {
            return SpeechAction::Silent;
        }
        self.speaking = true;
        SpeechAction::Speak(cleaned)
    }

    /// Playback finished on its own
    pub fn speech_finished(&mut self) {
        self.speaking = false;
    }

    /// Clear the visible conversation; history stores are untouched
    pub fn clear_conversation(&mut self) {
        self.turns.clear();
        self.in_flight = None;
    }

    /// Clear local history; for durable principals this is a no-op
    /// because their clear goes through the server and is only applied
    /// after confirmed success
    pub fn clear_local_history(&mut self) {
        if self.history_backend() == HistoryBackend::Local {
            self.local_history.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrincipalKind;

    fn guest_controller() -> ConversationController {
        ConversationController::new(Principal {
            id: "guest_1700000000000".into(),
            name: "Guest".into(),
            kind: PrincipalKind::Guest,
            photo: None,
        })
    }

    fn account_controller() -> ConversationController {
        ConversationController::new(Principal {
            id: "108234".into(),
            name: "Ada".into(),
            kind: PrincipalKind::Google,
            photo: None,
        })
    }

    #[test]
    fn test_empty_question_ignored() {
        let mut controller = guest_controller();
        assert_eq!(controller.submit("   "), SubmitOutcome::IgnoredEmpty);
        assert!(controller.turns().is_empty());
    }

    #[test]
    fn test_second_submit_rejected_while_awaiting() {
        let mut controller = guest_controller();
        let SubmitOutcome::Accepted(first) = controller.submit("one") else {
            panic!("first submit should be accepted");
        };
        assert_eq!(controller.submit("two"), SubmitOutcome::Busy);
        assert_eq!(controller.turns().len(), 1);

        controller.resolve(first, "answer");
        assert!(matches!(controller.submit("two"), SubmitOutcome::Accepted(_)));
    }

    #[test]
    fn test_turn_ids_monotonic_never_reused() {
        let mut controller = guest_controller();
        let mut seen = Vec::new();
        for i in 0..5 {
            let SubmitOutcome::Accepted(id) = controller.submit(&format!("q{i}")) else {
                panic!("submit should be accepted");
            };
            controller.fail(id);
            seen.push(id);
        }
        let mut sorted = seen.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted, seen);
    }

    #[test]
    fn test_resolve_formats_and_stores() {
        let mut controller = guest_controller();
        let SubmitOutcome::Accepted(id) = controller.submit("show code") else {
            panic!("submit should be accepted");
        };
        controller.resolve(id, "here\n```js\nlet x = 1;\n```");

        let turn = &controller.turns()[0];
        let TurnDisplay::Answered { raw, markup } = &turn.display else {
            panic!("turn should be answered");
        };
        assert!(raw.contains("let x = 1;"));
        assert!(markup.contains("code-block"));
        assert_eq!(controller.local_history().list(), vec!["show code"]);
    }

    #[test]
    fn test_failure_replaces_only_its_own_turn() {
        let mut controller = guest_controller();
        let SubmitOutcome::Accepted(first) = controller.submit("one") else {
            panic!("submit should be accepted");
        };
        controller.resolve(first, "fine");

        let SubmitOutcome::Accepted(second) = controller.submit("two") else {
            panic!("submit should be accepted");
        };
        controller.fail(second);

        assert!(matches!(
            controller.turns()[0].display,
            TurnDisplay::Answered { .. }
        ));
        assert_eq!(controller.turns()[1].display, TurnDisplay::Failed);
        assert!(!controller.is_awaiting_answer());
    }

    #[test]
    fn test_failure_does_not_touch_history() {
        let mut controller = guest_controller();
        let SubmitOutcome::Accepted(id) = controller.submit("doomed") else {
            panic!("submit should be accepted");
        };
        controller.fail(id);
        assert!(controller.local_history().is_empty());
    }

    #[test]
    fn test_durable_exchange_marks_history_stale() {
        let mut controller = account_controller();
        let SubmitOutcome::Accepted(id) = controller.submit("hello") else {
            panic!("submit should be accepted");
        };
        assert!(!controller.history_is_stale());
        controller.resolve(id, "hi");
        assert!(controller.history_is_stale());
        assert!(controller.local_history().is_empty());

        controller.mark_history_fresh();
        assert!(!controller.history_is_stale());
    }

    #[test]
    fn test_speech_toggle_semantics() {
        let mut controller = guest_controller();
        let SpeechAction::Speak(text) = controller.toggle_speech("hello **world**") else {
            panic!("should start speaking");
        };
        assert_eq!(text, "hello world");

        assert_eq!(controller.toggle_speech("anything"), SpeechAction::Stop);

        assert_eq!(controller.toggle_speech("a|b\nc|d"), SpeechAction::Silent);
    }

    #[test]
    fn test_clear_local_history_noop_for_durable() {
        let mut controller = account_controller();
        controller.clear_local_history();
        assert!(controller.local_history().is_empty());

        let mut guest = guest_controller();
        let SubmitOutcome::Accepted(id) = guest.submit("q") else {
            panic!("submit should be accepted");
        };
        guest.resolve(id, "a");
        assert_eq!(guest.local_history().len(), 1);
        guest.clear_local_history();
        assert!(guest.local_history().is_empty());
    }
}
