// ABOUTME: Server binary wiring configuration, storage, auth, and routes
// ABOUTME: Boots logging, migrates the database, and serves the HTTP app
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Chatme Server Binary
//!
//! Starts the chat web service: environment configuration, SQLite
//! bootstrap, session management, optional Google login, and the
//! OpenRouter-backed chat endpoint.

use anyhow::Result;
use chatme::{
    auth::AuthManager,
    config::ServerConfig,
    database::Database,
    llm::{LlmProvider, OpenRouterProvider},
    logging,
    oauth::GoogleOAuthClient,
    routes::{build_router, ServerResources},
};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "chatme-server")]
#[command(about = "Chatme - minimal authenticated LLM chat web service")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting Chatme server");
    info!("{}", config.summary());

    let database = Database::connect(&config.database_url).await?;
    database.migrate().await?;
    info!("Database ready at {}", config.database_url);

    let auth = AuthManager::new(&config.auth);

    let llm: Option<Arc<dyn LlmProvider>> = match config.llm.api_key.clone() {
        Some(api_key) => {
            let provider = OpenRouterProvider::new(chatme::llm::openrouter::OpenRouterConfig {
                base_url: config.llm.base_url.clone(),
                api_key,
                default_model: config.llm.model.clone(),
            })?;
            Some(Arc::new(provider))
        }
        None => {
            warn!("OPENROUTER_API_KEY not set; chat requests will fail until configured");
            None
        }
    };

    let oauth = match config.google.clone() {
        Some(google) => Some(GoogleOAuthClient::new(google)?),
        None => {
            warn!("Google OAuth not configured; only guest login is available");
            None
        }
    };

    let resources = Arc::new(ServerResources {
        database,
        auth,
        llm,
        oauth,
        config: config.clone(),
    });

    let app = build_router(resources);
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
