//! REST and WebSocket endpoints for onboarding sessions.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::machine::Rejection;
use super::manager::{OnboardingSession, TurnResult};
use super::model::ChatSnapshot;
use super::sessions::SessionRegistry;
use crate::error::OnboardingError;

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub registry: Arc<SessionRegistry>,
}

#[derive(Debug, Deserialize)]
struct TextRequest {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ButtonRequest {
    value: String,
}

// ── WebSocket protocol ──────────────────────────────────────────────────

/// Message from client → server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Text { content: String },
    Button { value: String },
}

/// Message from server → client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    SessionSync {
        session: ChatSnapshot,
        #[serde(skip_serializing_if = "Option::is_none")]
        rejection: Option<Rejection>,
    },
    Error {
        message: String,
    },
}

impl From<TurnResult> for ServerMessage {
    fn from(turn: TurnResult) -> Self {
        Self::SessionSync {
            session: turn.snapshot,
            rejection: turn.rejection,
        }
    }
}

/// Build the onboarding REST + WebSocket routes.
pub fn onboarding_routes(registry: Arc<SessionRegistry>) -> Router {
    let state = OnboardingRouteState { registry };

    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/text", post(submit_text))
        .route("/api/sessions/{id}/button", post(submit_button))
        .route("/ws/sessions/{id}", get(ws_handler))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

fn error_response(err: OnboardingError) -> Response {
    let status = match err {
        OnboardingError::Busy => StatusCode::CONFLICT,
        OnboardingError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
        OnboardingError::NoResponse { .. } | OnboardingError::Generation(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

fn turn_response(result: Result<TurnResult, OnboardingError>) -> Response {
    match result {
        Ok(turn) => Json(turn).into_response(),
        Err(e) => error_response(e),
    }
}

// ── REST ────────────────────────────────────────────────────────────────

async fn health(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "onboarding-chat",
        "sessions": state.registry.len().await,
    }))
}

/// GET /api/sessions
async fn list_sessions(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    Json(state.registry.statuses().await)
}

/// POST /api/sessions
///
/// Starts a fresh conversation with the welcome message already rendered.
async fn create_session(State(state): State<OnboardingRouteState>) -> Response {
    match state.registry.create().await {
        Ok(session) => (StatusCode::CREATED, Json(session.snapshot().await)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/sessions/{id}
async fn get_session(
    State(state): State<OnboardingRouteState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.registry.get(id).await {
        Ok(session) => Json(session.snapshot().await).into_response(),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/sessions/{id}
async fn delete_session(
    State(state): State<OnboardingRouteState>,
    Path(id): Path<Uuid>,
) -> Response {
    if state.registry.remove(id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(OnboardingError::SessionNotFound { id })
    }
}

/// POST /api/sessions/{id}/text
async fn submit_text(
    State(state): State<OnboardingRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TextRequest>,
) -> Response {
    match state.registry.get(id).await {
        Ok(session) => turn_response(session.submit_text(&body.content).await),
        Err(e) => error_response(e),
    }
}

/// POST /api/sessions/{id}/button
async fn submit_button(
    State(state): State<OnboardingRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ButtonRequest>,
) -> Response {
    match state.registry.get(id).await {
        Ok(session) => turn_response(session.submit_button(&body.value).await),
        Err(e) => error_response(e),
    }
}

// ── WebSocket ───────────────────────────────────────────────────────────

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<OnboardingRouteState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.registry.get(id).await {
        Ok(session) => {
            info!(session_id = %id, "WebSocket client connecting");
            ws.on_upgrade(move |socket| handle_socket(socket, session))
        }
        Err(e) => error_response(e),
    }
}

async fn handle_socket(mut socket: WebSocket, session: Arc<OnboardingSession>) {
    let sync = ServerMessage::SessionSync {
        session: session.snapshot().await,
        rejection: None,
    };
    if send_json(&mut socket, &sync).await.is_err() {
        warn!("Failed to send initial sync, client disconnected");
        return;
    }

    while let Some(result) = socket.recv().await {
        match result {
            Ok(Message::Text(text)) => {
                let reply = handle_client_message(&text, &session).await;
                if send_json(&mut socket, &reply).await.is_err() {
                    debug!("Client disconnected during send");
                    break;
                }
            }
            Ok(Message::Ping(data)) => {
                if socket.send(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    info!(session_id = %session.id(), "WebSocket client disconnected");
}

async fn handle_client_message(text: &str, session: &OnboardingSession) -> ServerMessage {
    let parsed: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            return ServerMessage::Error {
                message: format!("Invalid message: {e}"),
            };
        }
    };

    let result = match parsed {
        ClientMessage::Text { content } => session.submit_text(&content).await,
        ClientMessage::Button { value } => session.submit_button(&value).await,
    };

    match result {
        Ok(turn) => turn.into(),
        Err(e) => ServerMessage::Error {
            message: e.to_string(),
        },
    }
}

async fn send_json(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!("Failed to serialize server message: {}", e);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::prompts::CannedCatalog;

    #[test]
    fn client_messages_parse() {
        let text: ClientMessage =
            serde_json::from_str(r#"{"type":"text","content":"bob@acme.io"}"#).unwrap();
        assert!(matches!(text, ClientMessage::Text { content } if content == "bob@acme.io"));

        let button: ClientMessage =
            serde_json::from_str(r#"{"type":"button","value":"signup"}"#).unwrap();
        assert!(matches!(button, ClientMessage::Button { value } if value == "signup"));

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"reset"}"#).is_err());
    }

    #[test]
    fn error_statuses() {
        assert_eq!(error_response(OnboardingError::Busy).status(), StatusCode::CONFLICT);
        assert_eq!(
            error_response(OnboardingError::SessionNotFound { id: Uuid::nil() }).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_response(OnboardingError::Generation("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn client_message_drives_session() {
        let session = OnboardingSession::new(Arc::new(CannedCatalog));
        session.start().await.unwrap();

        let reply = handle_client_message(r#"{"type":"button","value":"signup"}"#, &session).await;
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "session_sync");
        assert_eq!(json["session"]["currentStep"], "email_input");
        assert_eq!(json["session"]["inputKind"], "text");
        assert!(json.get("rejection").is_none());

        let bad = handle_client_message("not json", &session).await;
        let json = serde_json::to_value(&bad).unwrap();
        assert_eq!(json["type"], "error");
    }
}
