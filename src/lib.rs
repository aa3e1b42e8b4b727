// ABOUTME: Main library entry point for the chatme conversational web app
// ABOUTME: Formatting pipeline, session model, dual-mode history, and HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![deny(unsafe_code)]

//! # Chatme
//!
//! A minimal authenticated chat web application. Users sign in with
//! Google or as a guest, ask questions that are forwarded to a hosted
//! LLM API, and get back formatted answers with per-user history.
//!
//! ## Architecture
//!
//! - **Formatters**: the response formatting pipeline (Markdown-ish
//!   model output to display markup) and the speech-clean filter
//! - **Conversation**: the turn-taking state machine and dual-mode
//!   history routing
//! - **Auth**: stateless JWT sessions for durable (Google) and
//!   ephemeral (guest) principals
//! - **Database**: SQLite persistence for accounts and their chat logs
//! - **LLM**: provider trait with an OpenRouter implementation
//! - **Routes**: the axum HTTP surface tying it all together

pub mod auth;
pub mod config;
pub mod conversation;
pub mod database;
pub mod errors;
pub mod formatters;
pub mod llm;
pub mod logging;
pub mod models;
pub mod oauth;
pub mod routes;
pub mod security;
