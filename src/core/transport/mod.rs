//! Transport layer for the MCP server.
//!
//! This module provides different transport implementations:
//! - **STDIO**: Standard input/output (default for MCP) - feature: `stdio`
//! - **SSE**: Event stream plus a POST message endpoint - feature: `sse`
//! - **HTTP**: JSON-RPC over POST with REST prompt endpoints - feature: `http`
//!
//! The network transports share one JSON-RPC dispatcher (`rpc`) and the
//! SSE framing helpers (`event_stream`).
//!
//! # Feature Flags
//!
//! Transport implementations are conditionally compiled based on features:
//! - `stdio`: STDIO transport - minimal dependencies
//! - `sse`: SSE transport - adds axum, tower, tower-http
//! - `http`: HTTP-streaming transport - adds axum, tower, tower-http

mod config;
mod error;
mod service;

#[cfg(any(feature = "sse", feature = "http"))]
pub mod event_stream;

#[cfg(any(feature = "sse", feature = "http"))]
pub mod rpc;

#[cfg(feature = "http")]
pub mod connections;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "sse")]
pub mod sse;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

// Re-export configs for convenience
#[cfg(feature = "sse")]
pub use config::SseConfig;

#[cfg(feature = "http")]
pub use config::HttpConfig;
