use crate::{EchoError, Result};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Configuration for the HTTP echo server
///
/// # Examples
///
/// ```rust
/// use echo_headers::http::HttpConfig;
///
/// let config = HttpConfig {
///     bind_addr: "127.0.0.1:8080".parse().unwrap(),
///     ..HttpConfig::default()
/// };
/// assert_eq!(config.max_headers, 100);
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Network address to bind to
    pub bind_addr: SocketAddr,
    /// How long an open connection may wait for its next request (None for no limit)
    pub idle_timeout: Option<Duration>,
    /// Largest request head (request line plus headers) accepted, in bytes
    pub max_head_size: usize,
    /// Maximum number of headers per request
    pub max_headers: usize,
    /// Value of the `Server` response header
    pub server_name: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            idle_timeout: None,
            max_head_size: 64 * 1024,
            max_headers: 100,
            server_name: format!("EchoHeaders/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Resolves `host:port`; an empty host binds all IPv4 interfaces.
pub async fn resolve_bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    if host.is_empty() {
        return Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
    }
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| EchoError::Config(format!("Failed to resolve host {host:?}: {e}")))?
        .next()
        .ok_or_else(|| EchoError::Config(format!("Host {host:?} resolved to no addresses")))
}
