use std::{
    collections::VecDeque,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse};
use docqa_core::{EmbeddingError, EmbeddingProvider};
use docqa_gemini::{GeminiClient, GeminiGenerator};
use docqa_rag::HashingEmbeddingProvider;
use docqa_server::{app_router, server::AppState};
use docqa_session::{Assistant, AssistantConfig};
use serde_json::{Value, json};

type Replies = Arc<Mutex<VecDeque<(StatusCode, Value)>>>;

/// Stand-in for the Gemini API: replays queued replies, then answers "ok".
async fn spawn_llm(replies: Vec<(StatusCode, Value)>) -> String {
    async fn reply(State(replies): State<Replies>) -> impl IntoResponse {
        let next = replies.lock().unwrap().pop_front();
        let (status, body) = next.unwrap_or_else(|| {
            (
                StatusCode::OK,
                json!({"candidates": [{"content": {"parts": [{"text": "ok"}], "role": "model"}}]}),
            )
        });
        (status, Json(body))
    }

    let state: Replies = Arc::new(Mutex::new(replies.into()));
    let app = Router::new().fallback(reply).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind llm listener");
    let addr = listener.local_addr().expect("llm addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("llm run");
    });
    format!("http://{}/v1beta/", addr)
}

/// Hashing embedder that takes its time over document batches.
struct SlowEmbedder {
    inner: HashingEmbeddingProvider,
    delay: Duration,
}

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    fn name(&self) -> &str {
        "slow"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        tokio::time::sleep(self.delay).await;
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

async fn spawn_server(
    llm_replies: Vec<(StatusCode, Value)>,
) -> (String, tempfile::TempDir, tokio::task::JoinHandle<()>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let (base, handle) =
        spawn_server_in(dir.path(), llm_replies, Arc::new(HashingEmbeddingProvider::default()))
            .await;
    (base, dir, handle)
}

/// Start a server whose indexes and uploads live under `data_dir`.
async fn spawn_server_in(
    data_dir: &Path,
    llm_replies: Vec<(StatusCode, Value)>,
    embedder: Arc<dyn EmbeddingProvider>,
) -> (String, tokio::task::JoinHandle<()>) {
    let llm = spawn_llm(llm_replies).await;
    let client = GeminiClient::builder("test-key")
        .base_url(url::Url::parse(&llm).expect("llm url"))
        .build()
        .expect("gemini client");
    let config = AssistantConfig::builder()
        .data_dir(data_dir)
        .chunk_size(80)
        .chunk_overlap(10)
        .max_upload_bytes(4096)
        .build()
        .expect("config");
    let assistant = Assistant::builder()
        .config(config)
        .embedder(embedder)
        .generator(Arc::new(GeminiGenerator::new(client)))
        .build()
        .expect("assistant");

    let app = app_router(AppState::new(assistant));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

async fn create_session(client: &reqwest::Client, base: &str) -> String {
    let created: Value = client
        .post(format!("{}/api/sessions", base))
        .send()
        .await
        .expect("session create response")
        .json()
        .await
        .expect("session json");
    created.get("session_id").and_then(Value::as_str).expect("session_id field").to_string()
}

async fn upload(
    client: &reqwest::Client,
    base: &str,
    session_id: &str,
    name: &str,
    body: &'static [u8],
) -> reqwest::Response {
    client
        .post(format!("{}/api/sessions/{}/documents?filename={}", base, session_id, name))
        .body(body)
        .send()
        .await
        .expect("upload response")
}

async fn ask(client: &reqwest::Client, base: &str, session_id: &str, q: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/sessions/{}/questions", base, session_id))
        .json(&json!({ "question": q }))
        .send()
        .await
        .expect("ask response")
}

const NOTES: &[u8] = b"The library opens at nine in the morning. \
    Books may be borrowed for three weeks. \
    Late returns cost ten cents per day.";

#[tokio::test]
async fn health_reports_ok() {
    let (base, _dir, handle) = spawn_server(vec![]).await;
    let body: Value =
        reqwest::get(format!("{}/health", base)).await.expect("health").json().await.expect("json");
    assert_eq!(body["status"], "ok");
    handle.abort();
}

#[tokio::test]
async fn question_before_upload_is_conflict() {
    let (base, _dir, handle) = spawn_server(vec![]).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;

    let response = ask(&client, &base, &session_id, "What is this about?").await;
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("error json");
    assert!(body["error"].as_str().expect("error field").contains("upload"));

    let history: Value = client
        .get(format!("{}/api/sessions/{}/history", base, session_id))
        .send()
        .await
        .expect("history")
        .json()
        .await
        .expect("history json");
    assert_eq!(history["turns"], json!([]));
    handle.abort();
}

#[tokio::test]
async fn upload_then_ask_answers_and_records_history() {
    let (base, _dir, handle) = spawn_server(vec![]).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;

    let response = upload(&client, &base, &session_id, "notes.txt", NOTES).await;
    assert!(response.status().is_success());
    let summary: Value = response.json().await.expect("summary json");
    assert_eq!(summary["document_id"], "notes.txt");
    assert!(summary["chunk_count"].as_u64().expect("chunk_count") >= 2);

    let turn: Value = ask(&client, &base, &session_id, "When does it open?")
        .await
        .json()
        .await
        .expect("turn json");
    assert_eq!(turn["answer"], "ok");
    assert_eq!(turn["status"], "answered");
    assert_eq!(turn["order"], 0);

    let status: Value = client
        .get(format!("{}/api/sessions/{}", base, session_id))
        .send()
        .await
        .expect("status")
        .json()
        .await
        .expect("status json");
    assert_eq!(status["ready"], true);
    assert_eq!(status["turn_count"], 1);
    handle.abort();
}

#[tokio::test]
async fn llm_error_becomes_failed_turn_and_next_question_works() {
    let (base, _dir, handle) =
        spawn_server(vec![(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "boom"}))]).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;
    upload(&client, &base, &session_id, "notes.txt", NOTES).await;

    let failed = ask(&client, &base, &session_id, "How long can I borrow?").await;
    assert!(failed.status().is_success());
    let failed: Value = failed.json().await.expect("turn json");
    assert_eq!(failed["status"], "failed");
    assert_eq!(failed["answer"], "LLM API error: HTTP 500");

    let next: Value =
        ask(&client, &base, &session_id, "Late fees?").await.json().await.expect("turn json");
    assert_eq!(next["status"], "answered");

    let history: Value = client
        .get(format!("{}/api/sessions/{}/history", base, session_id))
        .send()
        .await
        .expect("history")
        .json()
        .await
        .expect("history json");
    assert_eq!(history["turns"].as_array().expect("turns").len(), 2);
    handle.abort();
}

#[tokio::test]
async fn bad_uploads_are_client_errors() {
    let (base, _dir, handle) = spawn_server(vec![]).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;

    let unsupported = upload(&client, &base, &session_id, "table.xlsx", b"cells").await;
    assert_eq!(unsupported.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = unsupported.json().await.expect("error json");
    assert!(body["error"].as_str().expect("error").contains("docx, pdf, txt"));

    let empty = upload(&client, &base, &session_id, "empty.txt", b"   ").await;
    assert_eq!(empty.status(), reqwest::StatusCode::BAD_REQUEST);

    let too_large = client
        .post(format!("{}/api/sessions/{}/documents?filename=big.txt", base, session_id))
        .body(vec![b'a'; 8192])
        .send()
        .await
        .expect("upload response");
    assert_eq!(too_large.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);
    handle.abort();
}

#[tokio::test]
async fn blank_question_is_bad_request() {
    let (base, _dir, handle) = spawn_server(vec![]).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;
    upload(&client, &base, &session_id, "notes.txt", NOTES).await;

    let response = ask(&client, &base, &session_id, "   ").await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    handle.abort();
}

#[tokio::test]
async fn unknown_and_deleted_sessions_are_not_found() {
    let (base, _dir, handle) = spawn_server(vec![]).await;
    let client = reqwest::Client::new();

    let missing = client
        .get(format!("{}/api/sessions/{}/history", base, "not-a-session"))
        .send()
        .await
        .expect("history");
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let session_id = create_session(&client, &base).await;
    upload(&client, &base, &session_id, "notes.txt", NOTES).await;
    let deleted = client
        .delete(format!("{}/api/sessions/{}", base, session_id))
        .send()
        .await
        .expect("delete");
    assert_eq!(deleted.status(), reqwest::StatusCode::NO_CONTENT);

    let after = ask(&client, &base, &session_id, "anything?").await;
    assert_eq!(after.status(), reqwest::StatusCode::NOT_FOUND);
    handle.abort();
}

async fn status_of(client: &reqwest::Client, base: &str, session_id: &str) -> reqwest::Response {
    client
        .get(format!("{}/api/sessions/{}", base, session_id))
        .send()
        .await
        .expect("status response")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delete_waits_for_in_flight_upload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let embedder = Arc::new(SlowEmbedder {
        inner: HashingEmbeddingProvider::default(),
        delay: Duration::from_millis(400),
    });
    let (base, handle) = spawn_server_in(dir.path(), vec![], embedder).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;

    let uploading = tokio::spawn({
        let (client, base, session_id) = (client.clone(), base.clone(), session_id.clone());
        async move { upload(&client, &base, &session_id, "notes.txt", NOTES).await.status() }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let deleted = client
        .delete(format!("{}/api/sessions/{}", base, session_id))
        .send()
        .await
        .expect("delete");
    assert_eq!(deleted.status(), reqwest::StatusCode::NO_CONTENT);
    assert!(uploading.await.expect("upload task").is_success());

    let after = status_of(&client, &base, &session_id).await;
    assert_eq!(after.status(), reqwest::StatusCode::NOT_FOUND);
    assert!(!dir.path().join("indexes").join(&session_id).exists());
    assert!(!dir.path().join("uploads").join(&session_id).exists());
    handle.abort();
}

#[tokio::test]
async fn failed_delete_is_a_server_error_and_keeps_the_session() {
    let (base, dir, handle) = spawn_server(vec![]).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;

    // a plain file where the upload directory belongs cannot be removed as a directory
    std::fs::create_dir_all(dir.path().join("uploads")).expect("uploads dir");
    std::fs::write(dir.path().join("uploads").join(&session_id), b"x").expect("blocker");

    let deleted = client
        .delete(format!("{}/api/sessions/{}", base, session_id))
        .send()
        .await
        .expect("delete");
    assert_eq!(deleted.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = deleted.json().await.expect("error json");
    assert!(body["error"].is_string());

    let after = status_of(&client, &base, &session_id).await;
    assert_eq!(after.status(), reqwest::StatusCode::OK);
    handle.abort();
}

#[tokio::test]
async fn persisted_session_is_restored_on_first_use() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (base, first) =
        spawn_server_in(dir.path(), vec![], Arc::new(HashingEmbeddingProvider::default())).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;
    assert!(upload(&client, &base, &session_id, "notes.txt", NOTES).await.status().is_success());
    ask(&client, &base, &session_id, "When does it open?").await;
    first.abort();

    let (base, second) =
        spawn_server_in(dir.path(), vec![], Arc::new(HashingEmbeddingProvider::default())).await;
    let response = status_of(&client, &base, &session_id).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let status: Value = response.json().await.expect("status json");
    assert_eq!(status["ready"], true);
    assert_eq!(status["document_id"], "notes.txt");
    assert_eq!(status["turn_count"], 0);
    second.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_questions_on_a_restored_session_all_land_in_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (base, first) =
        spawn_server_in(dir.path(), vec![], Arc::new(HashingEmbeddingProvider::default())).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;
    assert!(upload(&client, &base, &session_id, "notes.txt", NOTES).await.status().is_success());
    first.abort();

    let (base, second) =
        spawn_server_in(dir.path(), vec![], Arc::new(HashingEmbeddingProvider::default())).await;
    let (a, b, c) = tokio::join!(
        ask(&client, &base, &session_id, "When does it open?"),
        ask(&client, &base, &session_id, "How long can I borrow?"),
        ask(&client, &base, &session_id, "Late fees?"),
    );
    for response in [a, b, c] {
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    let history: Value = client
        .get(format!("{}/api/sessions/{}/history", base, session_id))
        .send()
        .await
        .expect("history")
        .json()
        .await
        .expect("history json");
    let mut orders: Vec<u64> = history["turns"]
        .as_array()
        .expect("turns")
        .iter()
        .map(|turn| turn["order"].as_u64().expect("order"))
        .collect();
    orders.sort_unstable();
    assert_eq!(orders, vec![0, 1, 2]);
    second.abort();
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let (base, _dir, handle) = spawn_server(vec![]).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;

    let no_filename = client
        .post(format!("{}/api/sessions/{}/documents", base, session_id))
        .body(NOTES)
        .send()
        .await
        .expect("upload response");
    assert_eq!(no_filename.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = no_filename.json().await.expect("error json");
    assert!(body["error"].as_str().expect("error field").contains("filename"));

    let bad_json = client
        .post(format!("{}/api/sessions/{}/questions", base, session_id))
        .header("content-type", "application/json")
        .body("{\"question\":")
        .send()
        .await
        .expect("ask response");
    assert!(bad_json.status().is_client_error());
    let body: Value = bad_json.json().await.expect("error json");
    assert!(body["error"].is_string());

    let too_large = client
        .post(format!("{}/api/sessions/{}/documents?filename=big.txt", base, session_id))
        .body(vec![b'a'; 8192])
        .send()
        .await
        .expect("upload response");
    assert_eq!(too_large.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = too_large.json().await.expect("error json");
    assert!(body["error"].is_string());
    handle.abort();
}
