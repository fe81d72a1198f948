//! Assistant Integration Tests
//!
//! Exercises the chat endpoint end to end with a wiremock LLM provider and
//! an unreachable campus API (so context comes from the canned fallbacks).

use axum::Router;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use campus_hub::assistant::{self, AssistantState, FallbackData, FALLBACK_TIMETABLE};
use campus_hub::config::{LlmConfig, LlmProvider};
use campus_hub::db::{self, DbPool, TurnRole};
use campus_hub::services::LlmService;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MAX_IMAGE_SIZE: usize = 1024 * 1024;

// ============================================================================
// Test Setup Helpers
// ============================================================================

async fn setup_test_db() -> DbPool {
    let pool = db::init_pool(":memory:")
        .await
        .expect("Failed to create test database");
    db::initialize_schema(&pool)
        .await
        .expect("Failed to initialize schema");
    pool
}

/// Mount a Gemini-shaped mock that replies with `reply`.
async fn mock_llm(reply: &str) -> MockServer {
    let mock = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                { "content": { "parts": [ { "text": reply } ] } }
            ]
        })))
        .mount(&mock)
        .await;

    mock
}

fn llm_for(mock: &MockServer) -> LlmService {
    LlmService::new(&LlmConfig {
        providers: vec![LlmProvider {
            name: "gemini".to_string(),
            base_url: mock.uri(),
            model: "gemini-test".to_string(),
            api_key: "test-key".to_string(),
            priority: 1,
        }],
    })
}

/// Build a test server around an assistant whose campus API is unreachable,
/// forcing every data fetch onto the fallbacks.
async fn build_test_app(llm: LlmService) -> (TestServer, DbPool) {
    let pool = setup_test_db().await;

    let state = AssistantState::with_parts(
        pool.clone(),
        // Nothing listens here; connection refused immediately.
        "http://127.0.0.1:1".to_string(),
        FallbackData::default(),
        llm,
        40,
        MAX_IMAGE_SIZE,
    );

    let app = Router::new()
        .merge(assistant::routes(MAX_IMAGE_SIZE))
        .with_state(state);

    let server = TestServer::new(app).expect("Failed to create test server");
    (server, pool)
}

fn chat_form(user_id: &str, message: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("userId", user_id.to_string())
        .add_text("message", message.to_string())
}

// ============================================================================
// Chat Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let mock = mock_llm("unused").await;
    let (server, _pool) = build_test_app(llm_for(&mock)).await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["llm"]["available"], true);
}

#[tokio::test]
async fn test_chat_returns_model_reply() {
    let mock = mock_llm("You have no classes on Friday.").await;
    let (server, _pool) = build_test_app(llm_for(&mock)).await;

    let response = server
        .post("/chat")
        .multipart(chat_form("user-1", "What classes do I have on Friday?"))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["response"], "You have no classes on Friday.");
}

#[tokio::test]
async fn test_chat_requires_user_id() {
    let mock = mock_llm("unused").await;
    let (server, _pool) = build_test_app(llm_for(&mock)).await;

    let form = MultipartForm::new().add_text("message", "hello");
    let response = server.post("/chat").multipart(form).await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_chat_requires_message_or_image() {
    let mock = mock_llm("unused").await;
    let (server, _pool) = build_test_app(llm_for(&mock)).await;

    let form = MultipartForm::new()
        .add_text("userId", "user-1")
        .add_text("message", "   ");
    let response = server.post("/chat").multipart(form).await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_chat_image_only_is_accepted() {
    let mock = mock_llm("That looks like a flyer for the spring fest.").await;
    let (server, pool) = build_test_app(llm_for(&mock)).await;

    let form = MultipartForm::new().add_text("userId", "user-img").add_part(
        "image",
        Part::bytes(vec![0x89, 0x50, 0x4E, 0x47])
            .file_name("photo.png")
            .mime_type("image/png"),
    );

    let response = server.post("/chat").multipart(form).await;

    response.assert_status_ok();

    // The persisted user turn records the attachment as text.
    let turns = db::get_conversation(&pool, "user-img")
        .await
        .unwrap()
        .expect("conversation saved");
    let user_turn = turns
        .iter()
        .find(|t| t.role == TurnRole::User)
        .expect("user turn persisted");
    assert!(user_turn.text.starts_with("[image attached]"));
}

#[tokio::test]
async fn test_chat_rejects_non_image_attachment() {
    let mock = mock_llm("unused").await;
    let (server, _pool) = build_test_app(llm_for(&mock)).await;

    let form = MultipartForm::new().add_text("userId", "user-1").add_part(
        "image",
        Part::bytes(b"plain text".to_vec())
            .file_name("notes.txt")
            .mime_type("text/plain"),
    );

    let response = server.post("/chat").multipart(form).await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_chat_rejects_oversized_image() {
    let mock = mock_llm("unused").await;
    let (server, _pool) = build_test_app(llm_for(&mock)).await;

    let form = MultipartForm::new().add_text("userId", "user-1").add_part(
        "image",
        Part::bytes(vec![0u8; MAX_IMAGE_SIZE + 1])
            .file_name("huge.png")
            .mime_type("image/png"),
    );

    let response = server.post("/chat").multipart(form).await;

    assert_eq!(response.status_code(), 413);
}

#[tokio::test]
async fn test_chat_persists_history_across_requests() {
    let mock = mock_llm("Noted.").await;
    let (server, pool) = build_test_app(llm_for(&mock)).await;

    server
        .post("/chat")
        .multipart(chat_form("user-2", "When is the spring fest?"))
        .await
        .assert_status_ok();

    server
        .post("/chat")
        .multipart(chat_form("user-2", "And where is it held?"))
        .await
        .assert_status_ok();

    let turns = db::get_conversation(&pool, "user-2")
        .await
        .unwrap()
        .expect("conversation saved");

    // System seed plus two user/model pairs.
    assert_eq!(turns[0].role, TurnRole::System);
    let user_turns: Vec<_> = turns.iter().filter(|t| t.role == TurnRole::User).collect();
    let model_turns: Vec<_> = turns.iter().filter(|t| t.role == TurnRole::Model).collect();
    assert_eq!(user_turns.len(), 2);
    assert_eq!(model_turns.len(), 2);
    assert_eq!(model_turns[0].text, "Noted.");
}

#[tokio::test]
async fn test_chat_uses_fallback_context_when_api_down() {
    let mock = mock_llm("Here is your timetable.").await;
    let (server, pool) = build_test_app(llm_for(&mock)).await;

    server
        .post("/chat")
        .multipart(chat_form("user-3", "show me my timetable"))
        .await
        .assert_status_ok();

    // With the campus API unreachable, the persisted turn carries the
    // canned timetable verbatim.
    let turns = db::get_conversation(&pool, "user-3")
        .await
        .unwrap()
        .expect("conversation saved");
    let user_turn = turns
        .iter()
        .find(|t| t.role == TurnRole::User)
        .expect("user turn persisted");
    assert!(user_turn.text.contains("Campus data:"));
    assert!(user_turn.text.contains(FALLBACK_TIMETABLE));
}

#[tokio::test]
async fn test_chat_provider_failure_returns_bad_gateway() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock)
        .await;

    let (server, _pool) = build_test_app(llm_for(&mock)).await;

    let response = server
        .post("/chat")
        .multipart(chat_form("user-4", "hello"))
        .await;

    assert_eq!(response.status_code(), 502);
}
