//! Routes and action dispatch.
//!
//! - GET  /healthz
//! - GET  /api                   (service info)
//! - POST /api                   (dispatch on `action`)
//! - GET  /v1/models
//! - POST /v1/chat/completions

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::feedback::store::DEFAULT_QUERY_LIMIT;
use crate::feedback::{
    query_feedback, Feedback, FeedbackPage, FeedbackQuery, FeedbackSubmission, SharedFeedbackStore,
};
use crate::provider::SharedProvider;
use crate::server::chat::{run_chat, ChatInput};
use crate::server::error::{panic_response, ApiError, INVALID_ACTION};
use crate::server::openai_api::{ChatCompletionRequest, ChatRequest, FeedbackReceipt, ModelList};

/// Application state shared across handlers.
pub struct AppState {
    pub provider: SharedProvider,
    pub feedback: SharedFeedbackStore,
}

impl AppState {
    pub fn new(provider: SharedProvider, feedback: SharedFeedbackStore) -> Self {
        Self { provider, feedback }
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api", get(api_info).post(handle_api))
        .route("/v1/models", get(list_models))
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn api_info() -> Json<Value> {
    Json(json!({
        "message": "Gemini API Bridge is running",
        "endpoints": {
            "chat": "/api?action=chat",
            "models": "/api?action=models",
            "feedback": "/api?action=feedback (POST)",
            "getFeedback": "/api?action=getFeedback"
        }
    }))
}

async fn handle_api(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Rejected request body");
        ApiError::from(rejection)
    })?;

    let request_id = Uuid::new_v4().to_string();
    info!(request_id = request_id, action = req.action, "API request");

    match req.action.as_str() {
        "models" => Ok(Json(ModelList::catalog()).into_response()),
        "chat" => run_chat(state.provider.as_ref(), ChatInput::from(req)).await,
        "feedback" => submit_feedback(&state.feedback, req)
            .await
            .map(IntoResponse::into_response),
        "getFeedback" => Ok(list_feedback(&state.feedback, req).await.into_response()),
        other => {
            warn!(request_id = request_id, action = other, "Unknown action");
            Err(ApiError::BadRequest(INVALID_ACTION.to_string()))
        }
    }
}

async fn submit_feedback(
    store: &SharedFeedbackStore,
    req: ChatRequest,
) -> Result<Json<FeedbackReceipt>, ApiError> {
    let feedback = Feedback::from_submission(FeedbackSubmission {
        chat_id: req.chat_id,
        user_id: req.user_id,
        rating: req.rating,
        comment: req.comment,
    })
    .inspect_err(|e| warn!(error = %e, "Invalid feedback"))?;

    store.append(feedback.clone()).await;
    info!(id = feedback.id, chat_id = feedback.chat_id, rating = feedback.rating, "Feedback submitted");

    Ok(Json(FeedbackReceipt {
        success: true,
        feedback,
        message: "Feedback submitted successfully".to_string(),
    }))
}

async fn list_feedback(store: &SharedFeedbackStore, req: ChatRequest) -> Json<FeedbackPage> {
    let query = FeedbackQuery {
        chat_id: req.chat_id,
        limit: req.limit.unwrap_or(DEFAULT_QUERY_LIMIT),
    };
    Json(query_feedback(store.as_ref(), &query).await)
}

async fn list_models() -> Json<ModelList> {
    Json(ModelList::catalog())
}

async fn chat_completions(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    run_chat(state.provider.as_ref(), ChatInput::from(req)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::feedback::InMemoryFeedbackStore;
    use crate::provider::scripted::ScriptedProvider;

    fn app_with(provider: ScriptedProvider) -> (Router, SharedFeedbackStore) {
        let feedback = InMemoryFeedbackStore::shared();
        let state = Arc::new(AppState::new(Arc::new(provider), feedback.clone()));
        (build_router(state), feedback)
    }

    fn app() -> Router {
        app_with(ScriptedProvider::replying(["Hello", " there"])).0
    }

    fn post_api(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_healthz() {
        let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
        let (status, json) = send(app_with(ScriptedProvider::failing("down")).0, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_api_info() {
        let request = Request::builder().uri("/api").body(Body::empty()).unwrap();
        let (status, json) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Gemini API Bridge is running");
        for key in ["chat", "models", "feedback", "getFeedback"] {
            assert!(json["endpoints"][key].is_string(), "missing endpoint {key}");
        }
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let (status, json) = send(app(), post_api(json!({ "action": "dance" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({ "error": INVALID_ACTION }));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (status, json) = send(app(), post_api(json!({ "messages": [] }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], "Invalid request body");
        assert!(json["details"].is_string());
    }

    #[tokio::test]
    async fn test_models_action() {
        let (status, json) = send(app(), post_api(json!({ "action": "models" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["object"], "list");
        assert_eq!(json["data"][0]["id"], "gemini-pro");
        assert_eq!(json["data"][1]["id"], "gemini-pro-vision");
    }

    #[tokio::test]
    async fn test_chat_action() {
        let body = json!({
            "action": "chat",
            "model": "gemini-pro",
            "messages": [
                { "role": "system", "content": "be nice" },
                { "role": "assistant", "content": "ignored" },
                { "role": "user", "content": "hi" }
            ]
        });
        let (status, json) = send(app(), post_api(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["id"].as_str().unwrap().starts_with("chatcmpl-"));
        assert_eq!(json["model"], "gemini-pro");
        assert_eq!(json["choices"][0]["message"]["content"], "Hello there");
        // 7 + 7 + 2, dropped assistant message included.
        assert_eq!(json["usage"]["prompt_tokens"], 16);
        assert_eq!(json["usage"]["completion_tokens"], 11);
        assert_eq!(json["usage"]["total_tokens"], 27);
    }

    #[tokio::test]
    async fn test_chat_missing_messages() {
        let (status, json) = send(app(), post_api(json!({ "action": "chat" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Messages array is required");
    }

    #[tokio::test]
    async fn test_chat_provider_failure() {
        let body = json!({ "action": "chat", "messages": [{ "role": "user", "content": "hi" }] });
        let (status, json) = send(app_with(ScriptedProvider::failing("quota")).0, post_api(body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["details"], "Gemini API error: quota");
    }

    #[tokio::test]
    async fn test_feedback_validation() {
        for body in [
            json!({ "action": "feedback", "chatId": "c1", "rating": 0 }),
            json!({ "action": "feedback", "chatId": "c1", "rating": 6 }),
            json!({ "action": "feedback", "rating": 3 }),
            json!({ "action": "feedback", "chatId": "c1" }),
        ] {
            let (app, store) = app_with(ScriptedProvider::default());
            let (status, json) = send(app, post_api(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], "chatId and rating (1-5) are required");
            assert!(store.is_empty().await);
        }
    }

    #[tokio::test]
    async fn test_feedback_round_trip() {
        let (app, store) = app_with(ScriptedProvider::default());

        let (status, json) = send(
            app.clone(),
            post_api(json!({ "action": "feedback", "chatId": "c1", "rating": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Feedback submitted successfully");
        assert_eq!(json["feedback"]["userId"], "anonymous");
        assert_eq!(json["feedback"]["comment"], "");
        let id = json["feedback"]["id"].clone();

        let (status, json) = send(app, post_api(json!({ "action": "getFeedback" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["feedbacks"][0]["id"], id);
        assert_eq!(json["stats"]["total"], 1);
        assert_eq!(json["stats"]["averageRating"], 5.0);
        assert_eq!(
            json["stats"]["ratingDistribution"],
            json!({ "1": 0, "2": 0, "3": 0, "4": 0, "5": 1 })
        );
        assert_eq!(json["total"], store.len().await);
    }

    #[tokio::test]
    async fn test_get_feedback_unknown_chat() {
        let (app, _) = app_with(ScriptedProvider::default());
        send(
            app.clone(),
            post_api(json!({ "action": "feedback", "chatId": "c1", "rating": 2 })),
        )
        .await;

        let (_, json) = send(app, post_api(json!({ "action": "getFeedback", "chatId": "zzz" }))).await;
        assert_eq!(json["feedbacks"], json!([]));
        assert_eq!(json["stats"]["total"], 0);
        assert_eq!(json["stats"]["averageRating"], 0);
        assert_eq!(
            json["stats"]["ratingDistribution"],
            json!({ "1": 0, "2": 0, "3": 0, "4": 0, "5": 0 })
        );
        assert_eq!(json["total"], 1);
    }

    #[tokio::test]
    async fn test_v1_models() {
        let request = Request::builder().uri("/v1/models").body(Body::empty()).unwrap();
        let (status, json) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_v1_chat_completions() {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/chat/completions")
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({ "model": "gpt-4", "messages": [{ "role": "user", "content": "yo" }] }).to_string(),
            ))
            .unwrap();
        let (status, json) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["choices"][0]["message"]["content"], "Hello there");
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin_with_credentials() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api")
            .header("Origin", "http://example.com")
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "x-custom")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "http://example.com");
        assert_eq!(headers["access-control-allow-credentials"], "true");
    }
}
