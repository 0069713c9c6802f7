//! HTTP-streaming transport implementation.
//!
//! Serves MCP JSON-RPC over `POST /mcp` alongside a small REST surface for
//! prompts, a streamed variant of prompt rendering, and explicit connection
//! management with heartbeats.

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use bytes::Bytes;
use futures::stream;
use http::HeaderName;
use serde::Deserialize;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

use super::config::HttpConfig;
use super::connections::{ConnectionError, ConnectionManager};
use super::event_stream::{event_stream_response, json_event};
use super::rpc::{
    JsonRpcRequest, JsonRpcResponse, LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
    dispatch, is_supported_protocol_version, negotiate_protocol_version,
};
use super::{TransportError, TransportResult};
use crate::core::McpServer;
use crate::domains::prompts::{PromptError, PromptRequest, string_arguments};
use crate::domains::tools::ToolError;

/// Header carrying the negotiated MCP protocol revision.
pub const MCP_PROTOCOL_VERSION: HeaderName = HeaderName::from_static("mcp-protocol-version");

/// Header carrying the session id issued on `initialize`.
pub const MCP_SESSION_ID: HeaderName = HeaderName::from_static("mcp-session-id");

/// Optional header naming a connection registered via `POST /connect`.
pub const X_CONNECTION_ID: HeaderName = HeaderName::from_static("x-connection-id");

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    server: McpServer,
    connections: ConnectionManager,
    config: Arc<HttpConfig>,
    started: Instant,
}

impl HttpState {
    /// Create state for the given server and config.
    pub fn new(server: McpServer, config: HttpConfig) -> Self {
        let connections = ConnectionManager::new(
            Duration::from_secs(config.heartbeat_interval_secs.max(1)),
            config.max_error_count,
        );
        Self {
            server,
            connections,
            config: Arc::new(config),
            started: Instant::now(),
        }
    }

    /// The connection table.
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }
}

/// Body of `POST /prompts/{name}` and its streaming variant.
#[derive(Debug, Default, Deserialize)]
struct PromptArgumentsBody {
    #[serde(default)]
    arguments: serde_json::Map<String, Value>,
}

/// Body of `POST /tools/{name}`.
#[derive(Debug, Default, Deserialize)]
struct ToolArgumentsBody {
    #[serde(default)]
    arguments: serde_json::Map<String, Value>,
}

/// Body of `POST /connect`.
#[derive(Debug, Default, Deserialize)]
struct ConnectBody {
    #[serde(default)]
    client_info: Value,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the HTTP transport.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let rpc_path = self.config.rpc_path.clone();
        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };

        let state = HttpState::new(server, self.config);
        state.connections.start().await;
        let app = router(state.clone()).layer(TraceLayer::new_for_http());

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!(
            "Ready - listening on {} (HTTP streaming, CORS {})",
            addr, cors_status
        );
        info!("  → JSON-RPC: POST {}", rpc_path);
        info!("  → Prompts:  GET /prompts, POST /prompts/{{name}}[/stream]");
        info!("  → Tools:    GET /tools, POST /tools/{{name}}");
        info!("  → Health:   GET /health");

        let served = axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()));
        state.connections.stop().await;
        served
    }
}

/// Build the HTTP router for the given state.
pub fn router(state: HttpState) -> Router {
    let rpc_path = state.config.rpc_path.clone();
    let enable_cors = state.config.enable_cors;

    let mut app = Router::new()
        .route(
            &rpc_path,
            post(handle_rpc).get(rpc_get_not_allowed).delete(handle_rpc_delete),
        )
        .route("/prompts", get(list_prompts))
        .route("/prompts/{name}", post(render_prompt))
        .route("/prompts/{name}/stream", post(stream_prompt))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(call_tool))
        .route("/connect", post(connect_client))
        .route("/heartbeat/{id}", post(heartbeat))
        .route("/disconnect/{id}", delete(disconnect_client))
        .route("/connections", get(list_connections))
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/metrics", get(metrics))
        .route("/", get(root_handler))
        .layer(middleware::from_fn(protocol_version_middleware))
        .with_state(state);

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers([MCP_SESSION_ID, MCP_PROTOCOL_VERSION]);
        app = app.layer(cors);
    }

    app
}

/// Reject unsupported `MCP-Protocol-Version` headers and stamp the
/// negotiated revision on every response.
async fn protocol_version_middleware(request: Request, next: Next) -> Response {
    let requested = request
        .headers()
        .get(&MCP_PROTOCOL_VERSION)
        .map(|v| v.to_str().unwrap_or_default().to_string());

    if let Some(requested) = requested.as_deref() {
        if !is_supported_protocol_version(requested) {
            warn!("Rejected request with protocol version {:?}", requested);
            let mut response = (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::unsupported_protocol_version(requested)),
            )
                .into_response();
            response.headers_mut().insert(
                MCP_PROTOCOL_VERSION,
                HeaderValue::from_static(LATEST_PROTOCOL_VERSION),
            );
            return response;
        }
    }

    let negotiated = negotiate_protocol_version(requested.as_deref());
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(MCP_PROTOCOL_VERSION, HeaderValue::from_static(negotiated));
    response
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Whether the client only accepts an event stream.
fn wants_event_stream(headers: &HeaderMap) -> bool {
    let accept = header_str(headers, &header::ACCEPT).unwrap_or_default();
    accept.contains("text/event-stream")
        && !accept.contains("application/json")
        && !accept.contains("*/*")
}

fn parse_body<T>(body: &Bytes) -> Result<T, Response>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(JsonRpcResponse::parse_error(e.to_string())),
        )
            .into_response()
    })
}

/// A request naming a connection must name a live one.
async fn check_connection(state: &HttpState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(id) = header_str(headers, &X_CONNECTION_ID) else {
        return Ok(());
    };
    if state.connections.get(id).await.is_some() {
        return Ok(());
    }
    warn!(connection = %id, "Request for unknown connection");
    Err((
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("Unknown connection: {id}") })),
    )
        .into_response())
}

fn prompt_error_response(err: &PromptError) -> Response {
    let status = match err {
        PromptError::NotFound(_) => StatusCode::NOT_FOUND,
        PromptError::Validation(_) => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({ "error": err.details() }))).into_response()
}

/// Handle JSON-RPC requests.
#[instrument(skip_all, fields(method))]
async fn handle_rpc(State(state): State<HttpState>, headers: HeaderMap, body: Bytes) -> Response {
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
    tracing::Span::current().record("method", request.method.as_str());
    info!("Received JSON-RPC request: {}", request.method);

    if let Some(session) = header_str(&headers, &MCP_SESSION_ID) {
        if let Err(e) = state.connections.heartbeat(session).await {
            debug!("Session header not tracked: {}", e);
        }
    }

    let is_initialize = request.method == "initialize";
    let client_info = request
        .params
        .as_ref()
        .and_then(|p| p.get("clientInfo"))
        .cloned()
        .unwrap_or(Value::Null);

    let Some(response) = dispatch(&state.server, request).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    let mut session_id = None;
    if is_initialize && response.error.is_none() {
        let version = response
            .result
            .as_ref()
            .and_then(|r| r.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(LATEST_PROTOCOL_VERSION);
        match state.connections.connect(version, client_info).await {
            Ok(connection) => session_id = Some(connection.id),
            Err(e) => warn!("Could not register session: {}", e),
        }
    }

    let mut http_response = if wants_event_stream(&headers) {
        match serde_json::to_value(&response) {
            Ok(payload) => {
                let frame = json_event("message", &payload);
                event_stream_response(stream::iter([Ok::<_, Infallible>(frame)]))
            }
            Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        }
    } else {
        Json(response).into_response()
    };

    if let Some(id) = session_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
        http_response.headers_mut().insert(MCP_SESSION_ID, id);
    }
    http_response
}

/// `GET` on the JSON-RPC path: no server-initiated stream is offered.
async fn rpc_get_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST, DELETE")],
        "Server-initiated streams are not supported; POST JSON-RPC messages instead",
    )
        .into_response()
}

/// `DELETE` on the JSON-RPC path ends the session named by the header.
async fn handle_rpc_delete(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    let Some(session) = header_str(&headers, &MCP_SESSION_ID) else {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "POST")],
            "DELETE requires an Mcp-Session-Id header",
        )
            .into_response();
    };

    if state.connections.disconnect(session).await {
        Json(json!({ "status": "disconnected" })).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "error": "Unknown session" }))).into_response()
    }
}

/// List prompts.
async fn list_prompts(State(state): State<HttpState>) -> impl IntoResponse {
    let prompts = state.server.list_prompts();
    Json(json!({
        "total": prompts.len(),
        "prompts": prompts
    }))
}

fn prompt_request(name: String, body: &Bytes) -> Result<PromptRequest, Response> {
    let body: PromptArgumentsBody = parse_body(body)?;
    Ok(PromptRequest {
        prompt_id: name,
        arguments: string_arguments(body.arguments),
    })
}

/// Render a prompt and return it as JSON.
#[instrument(skip_all)]
async fn render_prompt(
    State(state): State<HttpState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(response) = check_connection(&state, &headers).await {
        return response;
    }
    let request = match prompt_request(name, &body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match state.server.render_prompt(&request) {
        Ok(rendered) => Json(rendered).into_response(),
        Err(e) => prompt_error_response(&e),
    }
}

/// Render a prompt and deliver it as a short event stream.
///
/// Failures surface as plain JSON errors before any event is sent.
#[instrument(skip_all)]
async fn stream_prompt(
    State(state): State<HttpState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(response) = check_connection(&state, &headers).await {
        return response;
    }
    let request = match prompt_request(name, &body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let rendered = match state.server.render_prompt(&request) {
        Ok(rendered) => rendered,
        Err(e) => return prompt_error_response(&e),
    };

    let events = vec![
        json_event(
            "start",
            &json!({ "type": "start", "prompt": rendered.prompt_id }),
        ),
        json_event(
            "info",
            &json!({ "type": "info", "description": rendered.description }),
        ),
        json_event(
            "message",
            &json!({
                "type": "message",
                "role": "user",
                "content": rendered.content,
                "metadata": rendered.metadata
            }),
        ),
        json_event("complete", &json!({ "type": "complete", "total_messages": 1 })),
    ];

    event_stream_response(stream::iter(events.into_iter().map(Ok::<_, Infallible>)))
}

/// List tools.
async fn list_tools(State(state): State<HttpState>) -> impl IntoResponse {
    let tools = state.server.list_tools();
    Json(json!({
        "total": tools.len(),
        "tools": tools
    }))
}

/// Call a tool and return its result.
///
/// Failures inside the tool come back as `isError: true` with `200`.
#[instrument(skip_all)]
async fn call_tool(
    State(state): State<HttpState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(response) = check_connection(&state, &headers).await {
        return response;
    }
    let body: ToolArgumentsBody = match parse_body(&body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    info!(tool = %name, "Tool call over REST");

    match state.server.call_tool(&name, Value::Object(body.arguments)).await {
        Ok(result) => Json(json!({ "result": result })).into_response(),
        Err(e) => {
            let status = match e {
                ToolError::NotFound(_) => StatusCode::NOT_FOUND,
                ToolError::InvalidArguments(_) => StatusCode::BAD_REQUEST,
                ToolError::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

/// Register a client connection.
async fn connect_client(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: ConnectBody = match parse_body(&body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let version = header_str(&headers, &MCP_PROTOCOL_VERSION).unwrap_or(LATEST_PROTOCOL_VERSION);

    let mut client_info = match body.client_info {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    if let Some(agent) = header_str(&headers, &header::USER_AGENT) {
        client_info.insert("user_agent".to_string(), json!(agent));
    }

    match state.connections.connect(version, Value::Object(client_info)).await {
        Ok(connection) => Json(json!({
            "connection_id": connection.id,
            "protocol_version": connection.protocol_version,
            "server_info": {
                "name": state.server.name(),
                "version": state.server.version()
            }
        }))
        .into_response(),
        Err(e) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

/// Record a heartbeat.
async fn heartbeat(State(state): State<HttpState>, Path(id): Path<String>) -> Response {
    match state.connections.heartbeat(&id).await {
        Ok(at) => Json(json!({ "status": "ok", "timestamp": at.to_rfc3339() })).into_response(),
        Err(e @ ConnectionError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() }))).into_response()
        }
        Err(e) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

/// Drop a connection.
async fn disconnect_client(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.connections.disconnect(&id).await;
    Json(json!({ "status": "disconnected" }))
}

/// List active connections.
async fn list_connections(State(state): State<HttpState>) -> impl IntoResponse {
    let connections = state.connections.active_connections().await;
    Json(json!({
        "total": connections.len(),
        "connections": connections,
        "stats": state.connections.stats().await
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<HttpState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "connections": state.connections.stats().await
    }))
}

/// Server metadata.
async fn server_info(State(state): State<HttpState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "description": state.server.instructions(),
        "transport": "http-stream",
        "protocol_versions": SUPPORTED_PROTOCOL_VERSIONS,
        "default_protocol_version": LATEST_PROTOCOL_VERSION,
        "features": {
            "streaming": true,
            "tools": true,
            "prompts": true,
            "heartbeat": true
        }
    }))
}

/// Server metrics.
async fn metrics(State(state): State<HttpState>) -> impl IntoResponse {
    Json(json!({
        "server": {
            "name": state.server.name(),
            "version": state.server.version(),
            "uptime_secs": state.started.elapsed().as_secs()
        },
        "connections": state.connections.stats().await,
        "protocol": {
            "supported_versions": SUPPORTED_PROTOCOL_VERSIONS,
            "default_version": LATEST_PROTOCOL_VERSION
        }
    }))
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<HttpState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP streaming",
        "endpoints": {
            "rpc": state.config.rpc_path,
            "prompts": "/prompts",
            "prompt": "/prompts/{name}",
            "prompt_stream": "/prompts/{name}/stream",
            "tools": "/tools",
            "tool": "/tools/{name}",
            "connect": "/connect",
            "heartbeat": "/heartbeat/{id}",
            "disconnect": "/disconnect/{id}",
            "connections": "/connections",
            "health": "/health",
            "info": "/info",
            "metrics": "/metrics"
        },
        "protocol": "JSON-RPC 2.0"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn state() -> HttpState {
        HttpState::new(McpServer::new(Config::default()), HttpConfig::default())
    }

    fn post_json(uri: &str, body: Value) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty(method: &str, uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_health_carries_protocol_header() {
        let response = router(state()).oneshot(empty("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(&MCP_PROTOCOL_VERSION).unwrap(),
            LATEST_PROTOCOL_VERSION
        );
    }

    #[tokio::test]
    async fn test_supported_protocol_header_is_echoed() {
        let request = axum::http::Request::builder()
            .uri("/info")
            .header(&MCP_PROTOCOL_VERSION, "2024-11-05")
            .body(Body::empty())
            .unwrap();
        let response = router(state()).oneshot(request).await.unwrap();
        assert_eq!(response.headers().get(&MCP_PROTOCOL_VERSION).unwrap(), "2024-11-05");
    }

    #[tokio::test]
    async fn test_unsupported_protocol_header_rejected() {
        let request = axum::http::Request::builder()
            .uri("/prompts")
            .header(&MCP_PROTOCOL_VERSION, "2.1")
            .body(Body::empty())
            .unwrap();
        let response = router(state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32000);
        assert_eq!(
            body["error"]["data"]["supported_versions"],
            json!(SUPPORTED_PROTOCOL_VERSIONS)
        );
    }

    #[tokio::test]
    async fn test_initialize_issues_session() {
        let state = state();
        let response = router(state.clone())
            .oneshot(post_json(
                "/mcp",
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "method": "initialize",
                    "params": { "protocolVersion": "2025-03-26", "clientInfo": { "name": "test" } }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let session = response
            .headers()
            .get(&MCP_SESSION_ID)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let connection = state.connections().get(&session).await.unwrap();
        assert_eq!(connection.protocol_version, "2025-03-26");
        assert_eq!(connection.client_info["name"], "test");

        let body = body_json(response).await;
        assert_eq!(body["result"]["protocolVersion"], "2025-03-26");

        let request = axum::http::Request::builder()
            .method("DELETE")
            .uri("/mcp")
            .header(&MCP_SESSION_ID, session.as_str())
            .body(Body::empty())
            .unwrap();
        let response = router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.connections().get(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_notification_accepted() {
        let response = router(state())
            .oneshot(post_json(
                "/mcp",
                json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_rpc_as_event_stream() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/mcp")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream")
            .body(Body::from(
                json!({ "jsonrpc": "2.0", "id": 9, "method": "prompts/list" }).to_string(),
            ))
            .unwrap();
        let response = router(state()).oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
        let text = body_text(response).await;
        assert!(text.starts_with("event: message\n"));
        assert!(text.contains("generate-requirements"));
    }

    #[tokio::test]
    async fn test_malformed_rpc_body() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/mcp")
            .body(Body::from("{not json"))
            .unwrap();
        let response = router(state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_get_and_bare_delete_not_allowed() {
        let response = router(state()).oneshot(empty("GET", "/mcp")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = router(state()).oneshot(empty("DELETE", "/mcp")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_list_prompts() {
        let response = router(state()).oneshot(empty("GET", "/prompts")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["prompts"][0]["name"], "generate-requirements");
    }

    #[tokio::test]
    async fn test_render_prompt() {
        let response = router(state())
            .oneshot(post_json(
                "/prompts/generate-requirements",
                json!({ "arguments": { "requirements": "a simple to-do app" } }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["content"].as_str().unwrap().contains("a simple to-do app"));
        assert_eq!(body["metadata"]["prompt_type"], "requirements_generation");
    }

    #[tokio::test]
    async fn test_render_prompt_errors() {
        let response = router(state())
            .oneshot(post_json("/prompts/generate-requirements", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"]["missing"],
            json!(["requirements"])
        );

        let response = router(state())
            .oneshot(empty("POST", "/prompts/unknown-prompt"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stream_prompt_events_in_order() {
        let response = router(state())
            .oneshot(post_json(
                "/prompts/generate-code-from-design/stream",
                json!({ "arguments": { "design_path": "docs/design.md" } }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let text = body_text(response).await;
        let events: Vec<&str> = text
            .lines()
            .filter_map(|l| l.strip_prefix("event: "))
            .collect();
        assert_eq!(events, vec!["start", "info", "message", "complete"]);
        assert!(text.contains("docs/design.md"));
    }

    #[tokio::test]
    async fn test_stream_prompt_fails_before_events() {
        let response = router(state())
            .oneshot(empty("POST", "/prompts/unknown-prompt/stream"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_connection_endpoints() {
        let state = state();
        let response = router(state.clone())
            .oneshot(post_json("/connect", json!({ "client_info": { "name": "cli" } })))
            .await
            .unwrap();
        let body = body_json(response).await;
        let id = body["connection_id"].as_str().unwrap().to_string();
        assert_eq!(body["protocol_version"], LATEST_PROTOCOL_VERSION);

        let response = router(state.clone())
            .oneshot(empty("POST", &format!("/heartbeat/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router(state.clone())
            .oneshot(empty("POST", "/heartbeat/does-not-exist"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router(state.clone())
            .oneshot(empty("GET", "/connections"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["connections"][0]["client_info"]["name"], "cli");

        router(state.clone())
            .oneshot(empty("DELETE", &format!("/disconnect/{id}")))
            .await
            .unwrap();
        assert_eq!(state.connections().stats().await.total_connections, 0);
    }

    #[tokio::test]
    async fn test_tool_endpoints() {
        let root = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.security.root_path = Some(root.path().to_path_buf());
        let state = HttpState::new(McpServer::new(config), HttpConfig::default());

        let response = router(state.clone())
            .oneshot(empty("GET", "/tools"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total"], 2);
        assert!(body["tools"][0]["inputSchema"].is_object());

        let response = router(state.clone())
            .oneshot(post_json(
                "/tools/create_file",
                json!({ "arguments": { "path": "specs/requirements.md", "content": "# Req" } }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["result"]["isError"], false);
        assert!(root.path().join("specs/requirements.md").exists());

        let response = router(state.clone())
            .oneshot(post_json(
                "/tools/read_file",
                json!({ "arguments": { "path": "missing.md" } }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["result"]["isError"], true);

        let response = router(state.clone())
            .oneshot(post_json("/tools/read_file", json!({ "arguments": {} })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router(state)
            .oneshot(post_json("/tools/delete_everything", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_connection_header_must_name_live_connection() {
        let state = state();
        let with_connection = |uri: &str, id: &str, body: Value| {
            axum::http::Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .header(&X_CONNECTION_ID, id)
                .body(Body::from(body.to_string()))
                .unwrap()
        };
        let prompt_body = json!({ "arguments": { "requirements": "a chat app" } });

        let response = router(state.clone())
            .oneshot(with_connection(
                "/prompts/generate-requirements",
                "stale",
                prompt_body.clone(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router(state.clone())
            .oneshot(with_connection("/tools/read_file", "stale", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let connection = state
            .connections()
            .connect(LATEST_PROTOCOL_VERSION, Value::Null)
            .await
            .unwrap();
        let response = router(state)
            .oneshot(with_connection(
                "/prompts/generate-requirements",
                &connection.id,
                prompt_body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics() {
        let state = state();
        state
            .connections()
            .connect("2025-03-26", Value::Null)
            .await
            .unwrap();

        let response = router(state).oneshot(empty("GET", "/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["server"]["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["connections"]["total_connections"], 1);
        assert_eq!(body["protocol"]["default_version"], LATEST_PROTOCOL_VERSION);
        assert_eq!(
            body["protocol"]["supported_versions"],
            json!(SUPPORTED_PROTOCOL_VERSIONS)
        );
    }
}
