//! SSE transport implementation.
//!
//! Clients open `GET /sse` and receive an `endpoint` event naming the URL to
//! POST JSON-RPC messages to. Replies come back on the stream as `message`
//! events; the POST itself only acknowledges receipt.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use futures::{StreamExt, stream};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, instrument, warn};

use super::config::SseConfig;
use super::event_stream::{KEEP_ALIVE, event_stream_response, format_event};
use super::rpc::{JsonRpcRequest, JsonRpcResponse, dispatch};
use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// Outbound queue depth per session.
const SESSION_BUFFER: usize = 64;

type Sessions = Arc<RwLock<HashMap<String, mpsc::Sender<String>>>>;

/// SSE transport handler.
pub struct SseTransport {
    config: SseConfig,
}

/// Application state shared across SSE handlers.
#[derive(Clone)]
pub struct SseState {
    server: McpServer,
    sessions: Sessions,
    keep_alive: Duration,
}

impl SseState {
    /// Create state for the given server.
    pub fn new(server: McpServer, keep_alive: Duration) -> Self {
        Self {
            server,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            keep_alive,
        }
    }

    /// Number of open event streams.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: String,
}

/// Removes the session when its event stream is dropped.
struct SessionGuard {
    id: String,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let id = std::mem::take(&mut self.id);
        let sessions = self.sessions.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                sessions.write().await.remove(&id);
                info!(session = %id, "SSE session closed");
            });
        }
    }
}

impl SseTransport {
    /// Create a new SSE transport with the given config.
    pub fn new(config: SseConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the SSE transport.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let state = SseState::new(server, Duration::from_secs(self.config.keep_alive_secs.max(1)));
        let app = router(state).layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!("Ready - listening on {} (MCP over SSE)", addr);
        info!("  → Events:   GET /sse");
        info!("  → Messages: POST /messages?session_id=<id>");
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Build the SSE router.
pub fn router(state: SseState) -> Router {
    Router::new()
        .route("/sse", get(handle_events))
        .route("/messages", post(handle_message))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Open an event stream for a new session.
async fn handle_events(State(state): State<SseState>) -> Response {
    let id = uuid::Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel::<String>(SESSION_BUFFER);
    state.sessions.write().await.insert(id.clone(), tx);
    info!(session = %id, "SSE session opened");

    let endpoint = format!("/messages?session_id={id}");
    let guard = SessionGuard {
        id,
        sessions: state.sessions.clone(),
    };

    let mut ticker = tokio::time::interval_at(
        tokio::time::Instant::now() + state.keep_alive,
        state.keep_alive,
    );
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let first =
        stream::once(async move { Ok::<_, Infallible>(format_event("endpoint", &endpoint)) });
    let rest = stream::unfold((rx, ticker, guard), |(mut rx, mut ticker, guard)| async move {
        let frame = tokio::select! {
            message = rx.recv() => message.map(|m| format_event("message", &m)),
            _ = ticker.tick() => Some(KEEP_ALIVE.to_string()),
        }?;
        Some((Ok::<_, Infallible>(frame), (rx, ticker, guard)))
    });

    event_stream_response(first.chain(rest))
}

/// Accept one JSON-RPC message for a session.
#[instrument(skip_all)]
async fn handle_message(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let Some(tx) = state.sessions.read().await.get(&query.session_id).cloned() else {
        warn!(session = %query.session_id, "Message for unknown session");
        return (StatusCode::NOT_FOUND, "Unknown session").into_response();
    };

    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::parse_error(e.to_string())),
            )
                .into_response();
        }
    };
    info!(session = %query.session_id, "Received JSON-RPC message: {}", request.method);

    if let Some(response) = dispatch(&state.server, request).await {
        let payload = match serde_json::to_string(&response) {
            Ok(payload) => payload,
            Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        };
        if tx.send(payload).await.is_err() {
            warn!("Session stream closed before reply was delivered");
            return (StatusCode::GONE, "Session closed").into_response();
        }
    }

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

/// Health check endpoint.
async fn health_check(State(state): State<SseState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "transport": "sse",
        "sessions": state.session_count().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        router(SseState::new(
            McpServer::new(Config::default()),
            Duration::from_secs(15),
        ))
    }

    async fn next_frame(body: &mut Body) -> String {
        let frame = body.frame().await.unwrap().unwrap();
        let data = frame.into_data().unwrap();
        String::from_utf8(data.to_vec()).unwrap()
    }

    fn endpoint_of(frame: &str) -> String {
        assert!(frame.starts_with("event: endpoint\n"));
        frame
            .lines()
            .find_map(|l| l.strip_prefix("data: "))
            .unwrap()
            .to_string()
    }

    fn post_message(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let response = app()
            .oneshot(post_message(
                "/messages?session_id=nope",
                serde_json::json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_round_trip_over_stream() {
        let app = app();
        let response = app
            .clone()
            .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );

        let mut body = response.into_body();
        let endpoint = endpoint_of(&next_frame(&mut body).await);
        assert!(endpoint.starts_with("/messages?session_id="));

        let ack = app
            .clone()
            .oneshot(post_message(
                &endpoint,
                serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "method": "prompts/get",
                    "params": { "name": "unknown-prompt" }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(ack.status(), StatusCode::ACCEPTED);

        let message_frame = next_frame(&mut body).await;
        assert!(message_frame.starts_with("event: message\n"));
        assert!(message_frame.contains("not_found"));
    }

    #[tokio::test]
    async fn test_notification_is_accepted_without_reply() {
        let state = SseState::new(McpServer::new(Config::default()), Duration::from_secs(15));
        let (tx, mut rx) = mpsc::channel(1);
        state.sessions.write().await.insert("s1".to_string(), tx);

        let response = router(state)
            .oneshot(post_message(
                "/messages?session_id=s1",
                serde_json::json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_stream_ends_session() {
        let state = SseState::new(McpServer::new(Config::default()), Duration::from_secs(15));
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let mut body = response.into_body();
        let endpoint = endpoint_of(&next_frame(&mut body).await);
        assert_eq!(state.session_count().await, 1);

        drop(body);
        // Removal is spawned from the guard's drop.
        for _ in 0..16 {
            if state.session_count().await == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(state.session_count().await, 0);

        let response = app
            .oneshot(post_message(
                &endpoint,
                serde_json::json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_idle_stream_sends_keep_alive() {
        let state = SseState::new(McpServer::new(Config::default()), Duration::from_millis(20));
        let response = router(state)
            .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let mut body = response.into_body();
        endpoint_of(&next_frame(&mut body).await);

        let frame = tokio::time::timeout(Duration::from_secs(5), next_frame(&mut body))
            .await
            .unwrap();
        assert_eq!(frame, KEEP_ALIVE);
    }
}
