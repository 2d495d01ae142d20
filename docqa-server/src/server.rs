use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Path, Query, State,
        rejection::{BytesRejection, JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use docqa_session::{Assistant, Session, UploadSummary};
use serde_json::json;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::ApiError,
    protocol::{
        AskRequest, HistoryResponse, SessionCreateResponse, SessionStatusResponse, UploadQuery,
    },
    sessions::SessionManager,
};
use docqa_core::ConversationTurn;

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant: Arc::new(assistant), sessions: SessionManager::default() }
    }

    /// Look up a live session, falling back to an index persisted by an
    /// earlier run of the server.
    async fn session(&self, session_id: Uuid) -> Result<Arc<Mutex<Session>>, ApiError> {
        if let Some(session) = self.sessions.get(session_id).await {
            return Ok(session);
        }
        match self.assistant.restore_session(session_id).await {
            Ok(session) => Ok(self.sessions.get_or_insert(session).await),
            Err(_) => Err(ApiError::session_not_found()),
        }
    }

    /// Lock a session for the rest of a request.
    ///
    /// A session deleted while the caller waited for the lock is not found.
    async fn lock(&self, raw_id: &str) -> Result<OwnedMutexGuard<Session>, ApiError> {
        let session_id = Uuid::parse_str(raw_id).map_err(|_| ApiError::session_not_found())?;
        let session = self.session(session_id).await?;
        let guard = Arc::clone(&session).lock_owned().await;
        if !self.sessions.is_current(session_id, &session).await {
            return Err(ApiError::session_not_found());
        }
        Ok(guard)
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8099 }
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let body_limit = state.assistant.config().max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{session_id}", get(session_status).delete(delete_session))
        .route("/api/sessions/{session_id}/documents", post(upload_document))
        .route("/api/sessions/{session_id}/questions", post(ask_question))
        .route("/api/sessions/{session_id}/history", get(history))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(config: ServerConfig, assistant: Assistant) -> anyhow::Result<()> {
    let app = app_router(AppState::new(assistant));
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for docqa server")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("docqa listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status":"ok","service":"docqa"}))
}

async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.assistant.create_session();
    let session_id = session.id();
    state.sessions.insert(session).await;
    (StatusCode::CREATED, Json(SessionCreateResponse { session_id }))
}

async fn session_status(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let session = state.lock(&session_id).await?;
    Ok(Json(SessionStatusResponse {
        session_id: session.id(),
        ready: session.is_ready(),
        document_id: session.document().map(|d| d.id.clone()),
        turn_count: session.history().len(),
    }))
}

async fn upload_document(
    Path(session_id): Path<String>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<UploadSummary>, ApiError> {
    let Query(query) = query?;
    let body = body?;
    let mut session = state.lock(&session_id).await?;
    let summary = state.assistant.process_upload(&mut session, &query.filename, &body).await?;
    Ok(Json(summary))
}

async fn ask_question(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    request: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<ConversationTurn>, ApiError> {
    let Json(request) = request?;
    let mut session = state.lock(&session_id).await?;
    let turn = state.assistant.ask(&mut session, &request.question).await?;
    Ok(Json(turn.clone()))
}

async fn history(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session = state.lock(&session_id).await?;
    Ok(Json(HistoryResponse { session_id: session.id(), turns: session.history().to_vec() }))
}

/// Remove a session and everything persisted for it.
///
/// Runs under the session lock so an in-flight upload finishes before its
/// files are removed. The session stays live if removal fails.
async fn delete_session(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let session = state.lock(&session_id).await?;
    let id = session.id();
    state.assistant.discard_session(id).await?;
    state.sessions.remove(id).await;
    Ok(StatusCode::NO_CONTENT)
}
