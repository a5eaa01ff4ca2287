//! Question endpoint

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use std::time::Instant;

use super::parse_session_id;
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse};

/// POST /api/sessions/:id/ask - answer and return the whole rendered history
pub async fn ask_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>> {
    let start = Instant::now();
    let id = parse_session_id(&id)?;
    let Json(request) = payload?;

    tracing::info!("Session {} question: {}", id, request.question);
    let (answer, history) = state.sessions().ask(id, &request.question).await?;

    Ok(Json(AskResponse {
        answer,
        history,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};

    use crate::ingestion::make_pdf;
    use crate::server::routes::tests::{create_session, multipart_request, send, test_router};
    use crate::testing::ScriptedChat;

    async fn ask(router: &Router, id: &str, question: &str) -> (StatusCode, Value) {
        let request = Request::post(format!("/api/sessions/{}/ask", id))
            .header("content-type", "application/json")
            .body(Body::from(json!({ "question": question }).to_string()))
            .unwrap();
        send(router, request).await
    }

    async fn processed_session(router: &Router) -> String {
        let id = create_session(router).await;
        let request = multipart_request(
            &format!("/api/sessions/{}/process", id),
            &[("policy.pdf", make_pdf(&["Refunds within 14 days", "Warranty lasts a year"]))],
        );
        let (status, _) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);
        id
    }

    #[tokio::test]
    async fn test_ask_before_process_conflicts() {
        let router = test_router(ScriptedChat::new());
        let id = create_session(&router).await;

        let (status, body) = ask(&router, &id, "anything?").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["type"], "not_ready");
    }

    #[tokio::test]
    async fn test_conversation_alternates_roles() {
        let router = test_router(
            ScriptedChat::new()
                .reply("Within 14 days.")
                .reply("How long does the warranty last?")
                .reply("One year."),
        );
        let id = processed_session(&router).await;

        let (status, body) = ask(&router, &id, "How fast are refunds?").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "Within 14 days.");

        let (status, body) = ask(&router, &id, "And the warranty?").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "One year.");

        let history = body["history"].as_array().unwrap();
        assert_eq!(history.len(), 4);
        let roles: Vec<&str> = history.iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user", "assistant"]);
        assert_eq!(history[2]["content"], "And the warranty?");
    }

    #[tokio::test]
    async fn test_empty_question() {
        let router = test_router(ScriptedChat::new());
        let id = processed_session(&router).await;

        let (status, body) = ask(&router, &id, "  ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "empty_question");
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_shape() {
        let router = test_router(ScriptedChat::new());
        let id = processed_session(&router).await;

        for body in ["{not json", r#"{"prompt": "missing question field"}"#] {
            let request = Request::post(format!("/api/sessions/{}/ask", id))
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap();
            let (status, body) = send(&router, request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["type"], "invalid_request");
            assert!(body["error"]["message"].is_string());
        }
    }

    #[tokio::test]
    async fn test_model_failure_is_reported() {
        let router = test_router(ScriptedChat::new().fail("upstream down"));
        let id = processed_session(&router).await;

        let (status, body) = ask(&router, &id, "How fast are refunds?").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["type"], "llm_error");

        let uri = format!("/api/sessions/{}", id);
        let (_, info) = send(&router, Request::get(&uri).body(Body::empty()).unwrap()).await;
        assert_eq!(info["history"].as_array().unwrap().len(), 0);
    }
}
