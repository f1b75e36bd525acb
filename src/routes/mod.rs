//! Router assembly: HTTP endpoints, static frontend, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod extract;
pub mod http;

/// Build the application router with:
/// - the two evaluation endpoints at `/api/execute` (canned) and `/api/run-code` (real)
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `static_dir` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>, static_dir: &str) -> Router {
    let static_service = ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{static_dir}/index.html")));

    Router::new()
        // Evaluation boundary
        .route("/api/execute", post(http::http_post_execute))
        .route("/api/run-code", post(http::http_post_run_code))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/challenges", get(http::http_get_challenges))
        .route("/api/v1/challenges/filters", get(http::http_get_challenge_filters))
        .route("/api/v1/challenges/:id", get(http::http_get_challenge))
        .route("/api/v1/challenges/:id/attempts", get(http::http_get_attempts))
        .route("/api/v1/definitions", get(http::http_get_definitions))
        .route("/api/v1/definitions/:id", get(http::http_get_definition))
        .route(
            "/api/v1/definitions/:id/read",
            post(http::http_post_mark_read).delete(http::http_delete_mark_read),
        )
        .route("/api/v1/profile/progress", get(http::http_get_progress))
        .route("/api/v1/auth/signup", post(http::http_post_signup))
        .route("/api/v1/auth/signin", post(http::http_post_signin))
        .route("/api/v1/auth/signout", post(http::http_post_signout))
        .route("/api/v1/auth/me", get(http::http_get_me))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::MemoryIdentity;
    use crate::domain::AttemptStatus;
    use crate::evaluation::tests::challenge;
    use crate::evaluation::TrivialOracle;
    use crate::seeds::seed_definitions;
    use crate::store::memory::MemoryStore;

    fn app() -> (MemoryStore, Router) {
        let store = MemoryStore::with_content(vec![challenge("c1", "print(1)\n")], seed_definitions());
        let state = AppState::with_parts(
            Arc::new(store.clone()),
            Arc::new(MemoryIdentity::new()),
            Arc::new(TrivialOracle),
        );
        (store, build_router(Arc::new(state), "./static"))
    }

    async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        call_raw(app, method, uri, token, body.map(|b| b.to_string())).await
    }

    async fn call_raw(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<String>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn sign_up(app: &Router) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({ "email": "ada@example.com", "password": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["accessToken"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn run_code_accepts_trimmed_match() {
        let (store, app) = app();
        let token = sign_up(&app).await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/run-code",
            Some(&token),
            Some(json!({ "code": "print(1)", "challengeId": "c1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "message": "Solution is correct!" }));
        assert_eq!(store.completions().await.len(), 1);
    }

    #[tokio::test]
    async fn run_code_rejects_different_code() {
        let (store, app) = app();
        let token = sign_up(&app).await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/run-code",
            Some(&token),
            Some(json!({ "code": "print(2)", "challengeId": "c1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Solution is incorrect. Try again!");
        assert_eq!(store.attempts().await[0].status, AttemptStatus::Failed);
    }

    #[tokio::test]
    async fn run_code_unknown_challenge_is_404() {
        let (store, app) = app();
        let token = sign_up(&app).await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/run-code",
            Some(&token),
            Some(json!({ "code": "x", "challengeId": "missing" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Challenge not found" }));
        assert!(store.attempts().await.is_empty());
    }

    #[tokio::test]
    async fn run_code_without_session_is_401() {
        let (store, app) = app();
        for token in [None, Some("not-a-session")] {
            let (status, body) = call(
                &app,
                Method::POST,
                "/api/run-code",
                token,
                Some(json!({ "code": "print(1)", "challengeId": "c1" })),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, json!({ "error": "Unauthorized" }));
        }
        assert!(store.attempts().await.is_empty());
    }

    #[tokio::test]
    async fn run_code_malformed_body_is_500() {
        let (store, app) = app();
        let token = sign_up(&app).await;
        let (status, body) =
            call_raw(&app, Method::POST, "/api/run-code", Some(&token), Some("{\"code\": ".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));

        let (status, _) = call(&app, Method::POST, "/api/run-code", Some(&token), Some(json!({ "code": 1 }))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.attempts().await.is_empty());
    }

    #[tokio::test]
    async fn run_code_without_challenge_id_is_404() {
        let (store, app) = app();
        let token = sign_up(&app).await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/run-code",
            Some(&token),
            Some(json!({ "code": "print(1)" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Challenge not found" }));
        assert!(store.attempts().await.is_empty());
        assert!(store.completions().await.is_empty());
    }

    #[tokio::test]
    async fn execute_returns_canned_result_and_writes_nothing() {
        let (store, app) = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/execute",
            None,
            Some(json!({ "code": "anything", "challengeId": "missing" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["output"], "Simulated output from code execution");
        assert_eq!(body["testResults"].as_array().map(|a| a.len()), Some(2));
        assert_eq!(body["executionTime"], "0.05s");
        assert!(store.attempts().await.is_empty());

        let (status, body) = call(&app, Method::POST, "/api/execute", None, Some(json!("nope"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn progress_buckets_completions_for_caller() {
        let (_, app) = app();
        let token = sign_up(&app).await;
        for _ in 0..2 {
            call(
                &app,
                Method::POST,
                "/api/run-code",
                Some(&token),
                Some(json!({ "code": "print(1)", "challengeId": "c1" })),
            )
            .await;
        }
        call(&app, Method::POST, "/api/v1/definitions/closures/read", Some(&token), None).await;

        let (status, body) = call(&app, Method::GET, "/api/v1/profile/progress", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["challenges"][0]["count"], 2);
        assert_eq!(body["definitions"][0]["count"], 1);

        let (status, _) = call(&app, Method::GET, "/api/v1/profile/progress", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn definition_read_toggle_round_trip() {
        let (_, app) = app();
        let token = sign_up(&app).await;

        let (status, body) = call(&app, Method::POST, "/api/v1/definitions/closures/read", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isRead"], true);

        let (_, list) = call(&app, Method::GET, "/api/v1/definitions?status=read", Some(&token), None).await;
        assert_eq!(list.as_array().map(|a| a.len()), Some(1));

        let (status, _) = call(&app, Method::DELETE, "/api/v1/definitions/closures/read", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, detail) = call(&app, Method::GET, "/api/v1/definitions/closures", Some(&token), None).await;
        assert_eq!(detail["isRead"], false);

        let (status, _) = call(&app, Method::POST, "/api/v1/definitions/closures/read", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn challenge_list_filters_and_detail() {
        let (_, app) = app();
        let (status, list) = call(&app, Method::GET, "/api/v1/challenges?language=python", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["id"], "c1");
        assert!(list[0].get("solution").is_none());

        let (_, empty) = call(&app, Method::GET, "/api/v1/challenges?difficulty=hard", None, None).await;
        assert_eq!(empty, json!([]));

        let (_, filters) = call(&app, Method::GET, "/api/v1/challenges/filters", None, None).await;
        assert_eq!(filters, json!({ "languages": ["python"], "topics": ["basics"] }));

        let (_, detail) = call(&app, Method::GET, "/api/v1/challenges/c1", None, None).await;
        assert_eq!(detail["solution"], "print(1)\n");

        let (status, _) = call(&app, Method::GET, "/api/v1/challenges/missing", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn attempts_history_for_signed_in_user() {
        let (_, app) = app();
        let token = sign_up(&app).await;
        call(
            &app,
            Method::POST,
            "/api/run-code",
            Some(&token),
            Some(json!({ "code": "print(0)", "challengeId": "c1" })),
        )
        .await;
        let (status, body) = call(&app, Method::GET, "/api/v1/challenges/c1/attempts", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["status"], "failed");
        assert_eq!(body[0]["code"], "print(0)");
    }

    #[tokio::test]
    async fn auth_endpoints_cover_session_lifecycle() {
        let (_, app) = app();
        let token = sign_up(&app).await;

        let (status, me) = call(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "ada@example.com");

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/auth/signin",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-pass" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({ "email": "ada@example.com", "password": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(&app, Method::POST, "/api/v1/auth/signout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_credentials_get_json_error_body() {
        let (_, app) = app();
        for uri in ["/api/v1/auth/signup", "/api/v1/auth/signin"] {
            let (status, body) = call(&app, Method::POST, uri, None, Some(json!({ "email": "ada@example.com" }))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "error": "Invalid request body" }));

            let (status, body) = call_raw(&app, Method::POST, uri, None, Some("not json".into())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Invalid request body");
        }
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (_, app) = app();
        let (status, body) = call(&app, Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
    }
}
