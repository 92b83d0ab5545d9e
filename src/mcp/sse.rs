//! SSE transport for web clients
//!
//! - `GET /sse` opens an event stream. The first event, `endpoint`, tells the
//!   client where to POST its messages; responses arrive as `message` events.
//! - `POST /messages/?session_id=<id>` accepts one JSON-RPC message and
//!   answers `202 Accepted`.
//! - `GET /health` answers `OK`.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures::Stream;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{HavonaMcpError, McpError, Result};
use crate::mcp::server::McpServer;
use crate::mcp::types::JsonRpcResponse;

/// Path clients POST messages to
pub const MESSAGES_PATH: &str = "/messages/";

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

type Sessions = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<JsonRpcResponse>>>>;

/// Shared state for the SSE routes
#[derive(Clone)]
pub struct SseState {
    server: Arc<McpServer>,
    sessions: Sessions,
}

impl SseState {
    /// Create state around a shared MCP server
    pub fn new(server: Arc<McpServer>) -> Self {
        Self {
            server,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of open SSE sessions
    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn sender(&self, session_id: &str) -> Option<mpsc::UnboundedSender<JsonRpcResponse>> {
        self.sessions.lock().ok()?.get(session_id).cloned()
    }
}

/// Removes its session when the event stream is dropped
struct SessionGuard {
    id: String,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(&self.id);
        }
        tracing::info!(session_id = %self.id, "SSE session closed");
    }
}

/// Build the SSE router
pub fn build_sse_app(state: SseState) -> Router {
    Router::new()
        .route("/sse", get(sse_handler))
        .route(MESSAGES_PATH, post(message_handler))
        .route("/messages", post(message_handler))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Bind the SSE listener; `host` may be a name, an IPv4 or a bare IPv6 address
pub async fn bind_listener(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port)).await.map_err(|e| {
        HavonaMcpError::Mcp(McpError::TransportError {
            message: format!("Failed to bind {} port {}: {}", host, port, e),
        })
    })
}

/// Serve the SSE transport until the listener fails
pub async fn run_sse(server: Arc<McpServer>, host: &str, port: u16) -> Result<()> {
    let listener = bind_listener(host, port).await?;
    let addr = listener.local_addr()?;
    let app = build_sse_app(SseState::new(server));

    tracing::info!("Havona MCP SSE server listening on http://{}", addr);
    tracing::info!("  GET  http://{}/sse - Open event stream", addr);
    tracing::info!("  POST http://{}{}?session_id=<id> - Send MCP messages", addr, MESSAGES_PATH);
    tracing::info!("  GET  http://{}/health - Health check", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn sse_handler(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4().simple().to_string();
    let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();

    if let Ok(mut sessions) = state.sessions.lock() {
        sessions.insert(session_id.clone(), tx);
    }
    tracing::info!(session_id = %session_id, "SSE session opened");

    let guard = SessionGuard {
        id: session_id.clone(),
        sessions: state.sessions.clone(),
    };

    let stream = async_stream::stream! {
        let _guard = guard;

        yield Ok::<_, Infallible>(Event::default()
            .event("endpoint")
            .data(format!("{}?session_id={}", MESSAGES_PATH, session_id)));

        while let Some(response) = rx.recv().await {
            match serde_json::to_string(&response) {
                Ok(data) => yield Ok(Event::default().event("message").data(data)),
                Err(e) => tracing::error!("Failed to serialize response: {}", e),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: Option<String>,
}

async fn message_handler(
    State(state): State<SseState>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> Response {
    let Some(session_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "session_id is required").into_response();
    };

    let Some(tx) = state.sender(&session_id) else {
        let err = McpError::UnknownSession { session_id };
        return (StatusCode::NOT_FOUND, err.to_string()).into_response();
    };

    if serde_json::from_str::<serde_json::Value>(&body).is_err() {
        return (StatusCode::BAD_REQUEST, "Could not parse message").into_response();
    }

    let server = state.server.clone();
    tokio::spawn(async move {
        if let Some(response) = server.handle_message(&body).await {
            if tx.send(response).is_err() {
                tracing::debug!(session_id = %session_id, "Session closed before response was sent");
            }
        }
    });

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
