//! End-to-end HTTP coverage: session CRUD and `/run`, driven against the
//! real router with `tower::ServiceExt::oneshot` rather than a bound socket.

use std::sync::Arc;

use aar_foundation::{InMemoryStore, MockWallet, SkillRegistry};
use aar_gateway::{build_app, AppState};
use aar_kernel::config::RuntimeConfig;
use aar_kernel::llm::FakeLlmProvider;
use aar_kernel::tool::ToolDescriptor;
use aar_kernel::turn::SessionKey;
use aar_runtime::tools::{RuntimeServices, SkillLocalRegistry};
use aar_runtime::AdaptiveAgentCore;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with_state(llm: FakeLlmProvider) -> (axum::Router, Arc<AppState>) {
    let wallet = Arc::new(MockWallet::new("agent-wallet", 100.0));
    let services = Arc::new(RuntimeServices { wallet, mcp: None, a2a: None, skill_locals: SkillLocalRegistry::new() });
    let core = Arc::new(AdaptiveAgentCore::new(
        RuntimeConfig::default(),
        Arc::new(InMemoryStore::new()),
        Arc::new(SkillRegistry::empty()),
        services,
        Arc::new(llm),
        Arc::new(FakeLlmProvider::new(vec![])),
    ));
    let state = Arc::new(AppState::new(core));
    (build_app(state.clone()), state)
}

fn app(llm: FakeLlmProvider) -> axum::Router {
    app_with_state(llm).0
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = app(FakeLlmProvider::new(vec![]));
    let response = app.oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn session_create_then_get_then_delete() {
    let app = app(FakeLlmProvider::new(vec![]));

    let create = app
        .clone()
        .oneshot(Request::builder().method("POST").uri("/apps/app1/users/alice/sessions/s1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::OK);

    let get = app.clone().oneshot(Request::builder().uri("/apps/app1/users/alice/sessions/s1").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(get.status(), StatusCode::OK);
    let value = body_json(get).await;
    assert_eq!(value["session_id"], "s1");

    let delete = app
        .clone()
        .oneshot(Request::builder().method("DELETE").uri("/apps/app1/users/alice/sessions/s1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(delete.status(), StatusCode::OK);

    let missing = app.oneshot(Request::builder().uri("/apps/app1/users/alice/sessions/s1").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_missing_session_is_404() {
    let app = app(FakeLlmProvider::new(vec![]));
    let response = app.oneshot(Request::builder().uri("/apps/app1/users/alice/sessions/nope").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn run_drives_a_turn_to_a_final_text_event() {
    let llm = FakeLlmProvider::new(vec![FakeLlmProvider::tool_call("1", "attempt_answer", json!({"answer": "42"}), 5)]);
    let app = app(llm);

    let body = json!({
        "app_name": "app1",
        "user_id": "alice",
        "session_id": "s1",
        "new_message": { "parts": [{ "text": "what is the answer?" }] },
    });

    let response = app
        .oneshot(Request::builder().method("POST").uri("/run").header("content-type", "application/json").body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = body_json(response).await;
    let events = events.as_array().unwrap();
    let has_answer = events.iter().any(|e| e["content"]["parts"].as_array().map(|parts| parts.iter().any(|p| p.get("text").and_then(|t| t.as_str()) == Some("42"))).unwrap_or(false));
    assert!(has_answer, "expected a text part carrying the final answer, got {events:?}");
}

#[tokio::test]
async fn confirmation_round_trips_through_the_real_gateway_handler() {
    let llm = FakeLlmProvider::new(vec![
        FakeLlmProvider::tool_call("1", "send_payment", json!({"recipient": "vendor", "amount": 5.0}), 5),
        FakeLlmProvider::tool_call("2", "attempt_answer", json!({"answer": "paid"}), 5),
    ]);
    let (app, state) = app_with_state(llm);
    let key = SessionKey::new("app1", "alice", "s1");

    {
        let mode_state = state.core.mode_state_handle(&key.as_storage_id());
        let mut guard = mode_state.lock().await;
        guard.mode.active_tool_set.insert(ToolDescriptor { require_confirmation: true, ..ToolDescriptor::builtin("send_payment", "send a payment", json!({})) });
    }

    let body = json!({
        "app_name": "app1",
        "user_id": "alice",
        "session_id": "s1",
        "new_message": { "parts": [{ "text": "please pay the vendor" }] },
    });
    let response = app
        .clone()
        .oneshot(Request::builder().method("POST").uri("/run").header("content-type", "application/json").body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = body_json(response).await;
    let confirmation_call = events
        .as_array()
        .unwrap()
        .iter()
        .find_map(|e| e["content"]["parts"].as_array().and_then(|parts| parts.iter().find_map(|p| p.get("functionCall"))))
        .expect("expected an adk_request_confirmation functionCall");
    assert_eq!(confirmation_call["name"], "adk_request_confirmation");
    let confirmation_id = confirmation_call["id"].as_str().unwrap().to_string();
    let original = &confirmation_call["args"]["originalFunctionCall"];
    assert_eq!(original["name"], "send_payment");
    assert_eq!(original["args"]["recipient"], "vendor");

    let resume_body = json!({
        "app_name": "app1",
        "user_id": "alice",
        "session_id": "s1",
        "new_message": { "parts": [{ "functionResponse": { "id": confirmation_id, "name": "adk_request_confirmation", "response": { "confirmed": true } } }] },
    });
    let resumed = app
        .oneshot(Request::builder().method("POST").uri("/run").header("content-type", "application/json").body(Body::from(resume_body.to_string())).unwrap())
        .await
        .unwrap();
    assert_eq!(resumed.status(), StatusCode::OK);

    let events = body_json(resumed).await;
    let has_final_answer = events
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["content"]["parts"].as_array().map(|parts| parts.iter().any(|p| p.get("text").and_then(|t| t.as_str()) == Some("paid"))).unwrap_or(false));
    assert!(has_final_answer, "expected the resumed turn to reach a final answer of 'paid', got {events:?}");
}

#[tokio::test]
async fn run_with_no_message_parts_is_a_bad_request() {
    let app = app(FakeLlmProvider::new(vec![]));
    let body = json!({
        "app_name": "app1",
        "user_id": "alice",
        "session_id": "s1",
        "new_message": { "parts": [] },
    });

    let response = app
        .oneshot(Request::builder().method("POST").uri("/run").header("content-type", "application/json").body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
