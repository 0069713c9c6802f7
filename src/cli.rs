//! Command-line interface.
//!
//! Flags override values loaded from the environment.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::core::{Config, Error, Result, TransportConfig};

/// Transport selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Standard input/output (default MCP mode).
    Stdio,
    /// Server-Sent Events with a POST message endpoint.
    Sse,
    /// JSON-RPC over HTTP with REST prompt endpoints.
    #[value(alias = "http")]
    HttpStream,
}

impl TransportKind {
    fn as_name(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Sse => "sse",
            Self::HttpStream => "http-stream",
        }
    }
}

/// Spec-driven development MCP server.
#[derive(Debug, Parser)]
#[command(version, about = "MCP server serving spec-driven development prompts")]
pub struct Cli {
    /// Transport to serve on.
    #[arg(long, value_enum)]
    pub transport: Option<TransportKind>,

    /// Bind host for network transports.
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port for network transports.
    #[arg(long)]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Workspace root the file tools are confined to.
    #[arg(long)]
    pub root_path: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(kind) = self.transport {
            config.transport = TransportConfig::from_name(kind.as_name()).ok_or_else(|| {
                Error::config(format!(
                    "transport '{}' is not compiled into this binary",
                    kind.as_name()
                ))
            })?;
        }

        if self.host.is_some() || self.port.is_some() {
            let transport = std::mem::take(&mut config.transport);
            config.transport = transport.with_address(self.host, self.port);
        }

        if let Some(level) = self.log_level {
            config.logging.level = level;
        }

        if let Some(root) = self.root_path {
            config.security.root_path = Some(root);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "spec-driven-mcp",
            "--transport",
            "http",
            "--port",
            "9000",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.transport, Some(TransportKind::HttpStream));
        assert_eq!(cli.port, Some(9000));
    }

    #[test]
    fn test_rejects_unknown_transport() {
        assert!(Cli::try_parse_from(["spec-driven-mcp", "--transport", "tcp"]).is_err());
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_apply_overrides() {
        let cli = Cli::try_parse_from([
            "spec-driven-mcp",
            "--transport",
            "http-stream",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--root-path",
            "/srv/project",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply(&mut config).unwrap();

        assert_eq!(config.transport.description(), "HTTP-stream on 0.0.0.0:9000/mcp");
        assert_eq!(
            config.security.root_path.as_deref(),
            Some(std::path::Path::new("/srv/project"))
        );
    }

    #[test]
    fn test_apply_without_flags_keeps_config() {
        let cli = Cli::try_parse_from(["spec-driven-mcp"]).unwrap();
        let mut config = Config::default();
        let before = config.transport.description();
        cli.apply(&mut config).unwrap();
        assert_eq!(config.transport.description(), before);
        assert_eq!(config.logging.level, "info");
    }
}
