//! Process configuration: sidecar addresses, listener addresses and the
//! transport client selection.
//!
//! Addresses are computed from explicit configuration when a client is
//! constructed. A missing sidecar port is reported by the constructor that
//! needs it, not papered over with a half-formed address.

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

pub const DAPR_HTTP_PORT: &str = "DAPR_HTTP_PORT";
pub const DAPR_GRPC_PORT: &str = "DAPR_GRPC_PORT";
pub const DAPR_API_TOKEN: &str = "DAPR_API_TOKEN";

const DEFAULT_SIDECAR_HOST: &str = "127.0.0.1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has an invalid port {value:?}")]
    InvalidPort { name: &'static str, value: String },
}

/// Location of the sidecar's HTTP and gRPC APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarConfig {
    host: String,
    http_port: Option<u16>,
    grpc_port: Option<u16>,
    api_token: Option<String>,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SIDECAR_HOST.to_string(),
            http_port: None,
            grpc_port: None,
            api_token: None,
        }
    }
}

impl SidecarConfig {
    /// Read `DAPR_HTTP_PORT`, `DAPR_GRPC_PORT` and `DAPR_API_TOKEN`.
    ///
    /// Unset variables are allowed here; only malformed values fail.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: DEFAULT_SIDECAR_HOST.to_string(),
            http_port: parse_port(DAPR_HTTP_PORT, lookup(DAPR_HTTP_PORT))?,
            grpc_port: parse_port(DAPR_GRPC_PORT, lookup(DAPR_GRPC_PORT))?,
            api_token: lookup(DAPR_API_TOKEN).filter(|token| !token.is_empty()),
        })
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = Some(port);
        self
    }

    pub fn with_grpc_port(mut self, port: u16) -> Self {
        self.grpc_port = Some(port);
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Token the sidecar expects in `dapr-api-token`, if it enforces one.
    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    /// Base URL of the sidecar HTTP API, e.g. `http://127.0.0.1:3500/`.
    pub fn http_base_url(&self) -> Result<String, ConfigError> {
        let port = self.http_port.ok_or(ConfigError::Missing(DAPR_HTTP_PORT))?;
        Ok(format!("http://{}:{}/", self.host, port))
    }

    /// Endpoint of the sidecar gRPC API, e.g. `http://127.0.0.1:50001`.
    pub fn grpc_endpoint(&self) -> Result<String, ConfigError> {
        let port = self.grpc_port.ok_or(ConfigError::Missing(DAPR_GRPC_PORT))?;
        Ok(format!("http://{}:{}", self.host, port))
    }
}

fn parse_port(name: &'static str, value: Option<String>) -> Result<Option<u16>, ConfigError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<u16>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidPort {
                name,
                value: raw.to_string(),
            }),
    }
}

/// Which transport client the process talks to the sidecar with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientKind {
    Http,
    Grpc,
    #[default]
    Sdk,
}

impl ClientKind {
    /// `http` and `grpc` select the direct clients; anything else is the SDK.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some("http") => ClientKind::Http,
            Some("grpc") => ClientKind::Grpc,
            _ => ClientKind::Sdk,
        }
    }
}

impl FromStr for ClientKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_arg(Some(s)))
    }
}

/// Listener addresses of the inventory process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenConfig {
    /// Public REST API.
    pub public: SocketAddr,
    /// Raw HTTP callbacks for the sidecar.
    pub events_http: SocketAddr,
    /// Raw gRPC `AppCallback` service.
    pub events_grpc: SocketAddr,
    /// SDK-mediated HTTP service.
    pub sdk_http: SocketAddr,
    /// SDK-mediated gRPC service.
    pub sdk_grpc: SocketAddr,
}

impl Default for ListenConfig {
    fn default() -> Self {
        let any = |port| SocketAddr::from(([0, 0, 0, 0], port));
        Self {
            public: any(3000),
            events_http: any(3001),
            events_grpc: any(4001),
            sdk_http: any(3002),
            sdk_grpc: any(4002),
        }
    }
}
