//! Transport configuration types.

use serde::{Deserialize, Serialize};

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// Server-Sent Events transport with a POST message endpoint.
    #[cfg(feature = "sse")]
    Sse(SseConfig),

    /// HTTP-streaming transport with REST and JSON-RPC endpoints.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// SSE transport configuration.
#[cfg(feature = "sse")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SseConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Seconds between keep-alive comments on open streams.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

/// HTTP-streaming transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path for JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,

    /// Seconds between connection sweeps.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Missed sweeps tolerated before a connection is dropped.
    #[serde(default = "default_max_error_count")]
    pub max_error_count: u32,
}

#[cfg(any(feature = "sse", feature = "http"))]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "sse")]
fn default_keep_alive_secs() -> u64 {
    15
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(feature = "http")]
fn default_heartbeat_interval_secs() -> u64 {
    30
}

#[cfg(feature = "http")]
fn default_max_error_count() -> u32 {
    3
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "sse"))]
        {
            return Self::Sse(SseConfig::default());
        }

        #[cfg(all(not(feature = "stdio"), not(feature = "sse"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "sse", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio, sse, or http");
        }
    }
}

#[cfg(feature = "sse")]
impl Default for SseConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: default_host(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            max_error_count: default_max_error_count(),
        }
    }
}

#[cfg(any(feature = "sse", feature = "http"))]
fn env_port(var: &str, fallback: u16) -> u16 {
    std::env::var(var)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(fallback)
}

impl TransportConfig {
    /// Create a STDIO transport config.
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio
    }

    /// Create an SSE transport config.
    #[cfg(feature = "sse")]
    pub fn sse(port: u16, host: impl Into<String>) -> Self {
        Self::Sse(SseConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Create an HTTP-streaming transport config.
    #[cfg(feature = "http")]
    pub fn http(port: u16, host: impl Into<String>) -> Self {
        Self::Http(HttpConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Build a default config for a transport name.
    ///
    /// Accepts `stdio`, `sse`, `http` and `http-stream`. Returns `None` for
    /// unknown names and for transports not compiled in.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            #[cfg(feature = "stdio")]
            "stdio" => Some(Self::Stdio),
            #[cfg(feature = "sse")]
            "sse" => Some(Self::Sse(SseConfig::default())),
            #[cfg(feature = "http")]
            "http" | "http-stream" | "http_stream" => Some(Self::Http(HttpConfig::default())),
            _ => None,
        }
    }

    /// Load transport config from environment variables.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match Self::from_name(&transport) {
            #[cfg(feature = "sse")]
            Some(Self::Sse(mut cfg)) => {
                cfg.port = env_port("MCP_SSE_PORT", cfg.port);
                cfg.host = std::env::var("MCP_SSE_HOST").unwrap_or(cfg.host);
                if let Some(secs) = std::env::var("MCP_SSE_KEEP_ALIVE_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                {
                    cfg.keep_alive_secs = secs;
                }
                Self::Sse(cfg)
            }
            #[cfg(feature = "http")]
            Some(Self::Http(mut cfg)) => {
                cfg.port = env_port("MCP_HTTP_PORT", cfg.port);
                cfg.host = std::env::var("MCP_HTTP_HOST").unwrap_or(cfg.host);
                cfg.rpc_path = std::env::var("MCP_HTTP_PATH").unwrap_or(cfg.rpc_path);
                cfg.enable_cors = std::env::var("MCP_HTTP_CORS")
                    .map(|v| v.to_lowercase() != "false" && v != "0")
                    .unwrap_or(true);
                if let Some(secs) = std::env::var("MCP_HEARTBEAT_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                {
                    cfg.heartbeat_interval_secs = secs;
                }
                Self::Http(cfg)
            }
            Some(other) => other,
            None => Self::default(),
        }
    }

    /// Override the bind address of a network transport.
    ///
    /// STDIO has no address, so it is returned unchanged.
    pub fn with_address(self, host: Option<String>, port: Option<u16>) -> Self {
        match self {
            #[cfg(feature = "sse")]
            Self::Sse(mut cfg) => {
                if let Some(host) = host {
                    cfg.host = host;
                }
                if let Some(port) = port {
                    cfg.port = port;
                }
                Self::Sse(cfg)
            }
            #[cfg(feature = "http")]
            Self::Http(mut cfg) => {
                if let Some(host) = host {
                    cfg.host = host;
                }
                if let Some(port) = port {
                    cfg.port = port;
                }
                Self::Http(cfg)
            }
            #[allow(unreachable_patterns)]
            other => {
                let _ = (host, port);
                other
            }
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "sse")]
            Self::Sse(cfg) => format!("SSE on {}:{}/sse", cfg.host, cfg.port),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP-stream on {}:{}{}", cfg.host, cfg.port, cfg.rpc_path),
        }
    }

    /// Check if this transport is the standard STDIO mode.
    pub fn is_stdio(&self) -> bool {
        #[cfg(feature = "stdio")]
        {
            matches!(self, Self::Stdio)
        }
        #[cfg(not(feature = "stdio"))]
        {
            false
        }
    }
}
