// ABOUTME: End-to-end tests for the HTTP surface via in-memory requests
// ABOUTME: Covers sessions, guest login, history routing, and auth gating
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chatme::auth::AuthManager;
use chatme::config::{AuthConfig, LlmConfig, ServerConfig};
use chatme::database::Database;
use chatme::models::{Principal, PrincipalKind};
use chatme::routes::{build_router, ServerResources};
use std::sync::Arc;
use tower::ServiceExt;

fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database_url: "sqlite::memory:".into(),
        auth: AuthConfig {
            session_secret: "route-test-secret-0123456789abcdef".into(),
            session_expiry_hours: 1,
            secure_cookies: false,
        },
        google: None,
        llm: LlmConfig {
            base_url: "http://127.0.0.1:9".into(),
            api_key: None,
            model: "test-model".into(),
        },
    }
}

async fn test_app() -> (Router, Arc<ServerResources>) {
    let config = test_config();
    let database = Database::connect(&config.database_url).await.unwrap();
    database.migrate().await.unwrap();

    let resources = Arc::new(ServerResources {
        database,
        auth: AuthManager::new(&config.auth),
        llm: None,
        oauth: None,
        config,
    });
    (build_router(resources.clone()), resources)
}

fn session_cookie_for(resources: &ServerResources, principal: &Principal) -> String {
    let token = resources.auth.mint_token(principal).unwrap();
    format!("auth_token={token}")
}

fn google_principal() -> Principal {
    Principal {
        id: "108234".into(),
        name: "Ada".into(),
        kind: PrincipalKind::Google,
        photo: None,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_ok() {
    let (app, _) = test_app().await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["llm_configured"], false);
}

#[tokio::test]
async fn test_user_endpoint_anonymous() {
    let (app, _) = test_app().await;
    let response = app
        .oneshot(Request::get("/api/user").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["loggedIn"], false);
    assert!(body.get("user").is_none());
}

#[tokio::test]
async fn test_guest_login_sets_session() {
    let (app, _) = test_app().await;
    let response = app
        .clone()
        .oneshot(
            Request::post("/auth/guest")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"Sam"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_owned();
    assert!(set_cookie.starts_with("auth_token="));
    assert!(set_cookie.contains("HttpOnly"));

    let cookie_pair = set_cookie.split(';').next().unwrap().to_owned();
    let response = app
        .oneshot(
            Request::get("/api/user")
                .header(header::COOKIE, cookie_pair)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["loggedIn"], true);
    assert_eq!(body["user"]["name"], "Sam");
    assert_eq!(body["user"]["type"], "guest");
    assert!(body["user"]["id"].as_str().unwrap().starts_with("guest_"));
}

#[tokio::test]
async fn test_guest_login_requires_name() {
    let (app, _) = test_app().await;
    let response = app
        .oneshot(
            Request::post("/auth/guest")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"   "}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_requires_session() {
    let (app, _) = test_app().await;
    let response = app
        .oneshot(
            Request::post("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"question":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_chat_rejects_empty_question() {
    let (app, resources) = test_app().await;
    let cookie = session_cookie_for(&resources, &google_principal());
    let response = app
        .oneshot(
            Request::post("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, cookie)
                .body(Body::from(r#"{"question":"  "}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_without_api_key_is_server_error() {
    let (app, resources) = test_app().await;
    let cookie = session_cookie_for(&resources, &google_principal());
    let response = app
        .oneshot(
            Request::post("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, cookie)
                .body(Body::from(r#"{"question":"hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Server API key not configured.");
}

#[tokio::test]
async fn test_history_empty_for_guest_sessions() {
    let (app, resources) = test_app().await;
    let guest = Principal {
        id: "guest_1700000000000".into(),
        name: "Sam".into(),
        kind: PrincipalKind::Guest,
        photo: None,
    };
    // even with matching server rows, a guest never reads server history
    resources
        .database
        .history()
        .record_exchange("guest_1700000000000", "q", "a")
        .await
        .unwrap();

    let cookie = session_cookie_for(&resources, &guest);
    let response = app
        .oneshot(
            Request::get("/api/history")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["history"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_history_fetch_and_clear_for_account() {
    let (app, resources) = test_app().await;
    let principal = google_principal();
    let history = resources.database.history();
    history.record_exchange(&principal.id, "first", "a1").await.unwrap();
    history.record_exchange(&principal.id, "second", "a2").await.unwrap();

    let cookie = session_cookie_for(&resources, &principal);
    let response = app
        .clone()
        .oneshot(
            Request::get("/api/history")
                .header(header::COOKIE, cookie.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    let questions: Vec<&str> = body["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["question"].as_str().unwrap())
        .collect();
    assert_eq!(questions, vec!["second", "first"]);

    let response = app
        .clone()
        .oneshot(
            Request::delete("/api/clear-history")
                .header(header::COOKIE, cookie.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::get("/api/history")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["history"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_clear_history_rejected_for_guests() {
    let (app, resources) = test_app().await;
    let guest = Principal {
        id: "guest_1700000000000".into(),
        name: "Sam".into(),
        kind: PrincipalKind::Guest,
        photo: None,
    };
    let cookie = session_cookie_for(&resources, &guest);
    let response = app
        .oneshot(
            Request::delete("/api/clear-history")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookie_and_redirects() {
    let (app, _) = test_app().await;
    let response = app
        .oneshot(Request::get("/logout").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/index.html"
    );

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(set_cookie.starts_with("auth_token=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_google_login_unconfigured_is_server_error() {
    let (app, _) = test_app().await;
    let response = app
        .oneshot(Request::get("/auth/google").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_tampered_session_is_rejected() {
    let (app, resources) = test_app().await;
    let mut cookie = session_cookie_for(&resources, &google_principal());
    cookie.push('x');

    let response = app
        .oneshot(
            Request::post("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, cookie)
                .body(Body::from(r#"{"question":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
