//! Server-Sent Events framing shared by the SSE and HTTP-streaming transports.

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::Response,
};
use futures::Stream;
use std::convert::Infallible;

/// Comment line sent to keep idle streams open through proxies.
pub const KEEP_ALIVE: &str = ": keep-alive\n\n";

/// Frame one SSE event. Multi-line data is split over several `data:` lines.
pub fn format_event(event: &str, data: &str) -> String {
    let mut frame = format!("event: {event}\n");
    for line in data.split('\n') {
        frame.push_str("data: ");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

/// Frame a JSON payload as an SSE event.
pub fn json_event(event: &str, data: &serde_json::Value) -> String {
    format_event(event, &data.to_string())
}

/// Wrap a stream of pre-framed events in a `text/event-stream` response.
pub fn event_stream_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<String, Infallible>> + Send + 'static,
{
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(stream))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build SSE response: {}", e);
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .unwrap_or_default()
        })
}
