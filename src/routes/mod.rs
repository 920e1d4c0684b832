//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

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

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...` (plus `/api/submit` for older clients)
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers), adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/blocks", get(http::http_get_blocks))
        .route("/api/v1/session", post(http::http_post_session))
        .route(
            "/api/v1/session/:id",
            get(http::http_get_session).delete(http::http_delete_session),
        )
        .route("/api/v1/session/:id/attempt", post(http::http_post_attempt))
        .route("/api/v1/submit", post(http::http_post_submit))
        .route("/api/submit", post(http::http_post_submit))
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
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::catalog::Catalog;
    use crate::config::GameSettings;
    use crate::submission::{JsonFileStore, SubmissionStore};

    fn app(dir: &std::path::Path) -> (Router, Arc<AppState>) {
        let store = SubmissionStore::JsonFile(JsonFileStore::new(dir.join("users.json")));
        let state = Arc::new(AppState::new(Catalog::builtin(), GameSettings::default(), store));
        (build_router(state.clone()), state)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        send(app, method, uri, body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty)).await
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Body) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    async fn target_of(state: &AppState, id: &str) -> String {
        let sessions = state.sessions.read().await;
        sessions[id].engine.current_round().unwrap().target.id.clone()
    }

    #[tokio::test]
    async fn health_and_blocks() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (app, _) = app(temp_dir.path());
        let (status, body) = call(&app, Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));

        let (status, body) = call(&app, Method::GET, "/api/v1/blocks", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blocks"].as_array().unwrap().len(), 8);
        assert_eq!(body["blocks"][0]["shortName"], "Educator");
    }

    #[tokio::test]
    async fn full_game_over_http() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (app, state) = app(temp_dir.path());

        let (status, body) = call(&app, Method::POST, "/api/v1/session", Some(json!({"name": "Ana", "seed": 7}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["sessionId"].as_str().unwrap().to_string();
        assert_eq!(body["round"]["options"].as_array().unwrap().len(), 4);
        let uri = format!("/api/v1/session/{id}/attempt");

        // Wrong drop: nothing moves, tiles stay put.
        let target = target_of(&state, &id).await;
        let wrong = body["round"]["options"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["id"].as_str().unwrap().to_string())
            .find(|o| *o != target)
            .unwrap();
        let (status, res) = call(&app, Method::POST, &uri, Some(json!({"blockId": wrong}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["correct"], json!(false));
        assert_eq!(res["session"]["currentIndex"], json!(0));
        assert_eq!(res["session"]["round"], body["round"]);

        for i in 0..4 {
            let target = target_of(&state, &id).await;
            let (_, res) = call(&app, Method::POST, &uri, Some(json!({"blockId": target}))).await;
            assert_eq!(res["outcome"], "correct");
            assert_eq!(res["session"]["score"], json!((i + 1) * 10));
        }

        let (_, snap) = call(&app, Method::GET, &format!("/api/v1/session/{id}"), None).await;
        assert_eq!(snap["completed"], json!(true));
        assert!(snap["round"].is_null());

        let (status, _) = call(&app, Method::POST, &uri, Some(json!({"blockId": "ed"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, res) = call(
            &app,
            Method::POST,
            "/api/submit",
            Some(json!({"name": "Ana", "email": "ana@example.org", "score": 40, "sessionId": id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["success"], json!(true));

        // Submitting ends the session.
        let (status, _) = call(&app, Method::GET, &format!("/api/v1/session/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_requests_map_to_status_codes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (app, _) = app(temp_dir.path());

        let (status, _) = call(&app, Method::POST, "/api/v1/session", Some(json!({"name": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::GET, "/api/v1/session/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, res) = call(&app, Method::POST, "/api/v1/submit", Some(json!({"name": "Ana", "email": "nope"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["success"], json!(false));
    }

    #[tokio::test]
    async fn malformed_submit_bodies_keep_the_submit_shape() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (app, _) = app(temp_dir.path());

        for score in [json!(-5), json!(12.5), json!("forty")] {
            let body = json!({"name": "Ana", "email": "ana@example.org", "score": score});
            let (status, res) = call(&app, Method::POST, "/api/submit", Some(body)).await;
            assert!(status.is_client_error(), "{status}");
            assert_eq!(res["success"], json!(false));
            assert!(!res["message"].as_str().unwrap().is_empty());
        }

        let (status, res) = send(&app, Method::POST, "/api/v1/submit", Body::from("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["success"], json!(false));
        assert!(!temp_dir.path().join("users.json").exists());
    }

    #[tokio::test]
    async fn abandoning_a_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (app, _) = app(temp_dir.path());
        let (_, body) = call(&app, Method::POST, "/api/v1/session", Some(json!({"name": "Bo"}))).await;
        let uri = format!("/api/v1/session/{}", body["sessionId"].as_str().unwrap());

        let (status, _) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
