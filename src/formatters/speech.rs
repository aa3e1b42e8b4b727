// ABOUTME: Speech cleaning filter producing speakable text from raw answers
// ABOUTME: Strips tables, markup, emoji, and punctuation noise before TTS
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-to-speech preprocessing. Works on the raw answer, never on the
//! formatted markup, so display changes cannot alter what is spoken.

use regex::Regex;
use std::sync::LazyLock;

static HTML_TABLE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<table.*?</table>").ok());

static TAG_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]*>").ok());

static EMOJI_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[\x{1F600}-\x{1F6FF}\x{2700}-\x{27BF}]").ok());

static MARKDOWN_PUNCT_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[`*_#>\[\]{}]").ok());

static SENTENCE_PUNCT_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new("[.;!?:\"\u{201C}\u{201D}]").ok());

static WHITESPACE_RUN_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

/// Drop contiguous runs of pipe-bearing lines, the raw-text form of a table
fn strip_pipe_tables(raw: &str) -> String {
    raw.split('\n')
        .filter(|line| !line.contains('|'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reduce a raw answer to speakable plain text
///
/// Returns an empty string when nothing speakable remains; callers treat
/// that as "do not speak".
#[must_use]
pub fn clean_for_speech(raw: &str) -> String {
    let mut text = strip_pipe_tables(raw);

    if let Some(pattern) = HTML_TABLE_PATTERN.as_ref() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    if let Some(pattern) = TAG_PATTERN.as_ref() {
        text = pattern.replace_all(&text, " ").into_owned();
    }
    if let Some(pattern) = EMOJI_PATTERN.as_ref() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    if let Some(pattern) = MARKDOWN_PUNCT_PATTERN.as_ref() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    if let Some(pattern) = SENTENCE_PUNCT_PATTERN.as_ref() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    if let Some(pattern) = WHITESPACE_RUN_PATTERN.as_ref() {
        text = pattern.replace_all(&text, " ").into_owned();
    }
    text.trim().to_owned()
}
