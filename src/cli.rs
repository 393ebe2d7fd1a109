//! Command-line arguments for the echo-headers binary.

use crate::Result;
use crate::http::{HttpConfig, resolve_bind_addr};
use clap::Parser;

/// HTTP server that echoes headers to the client
#[derive(Parser, Debug, Clone)]
#[command(name = "echo-headers")]
#[command(version)]
#[command(about = "HTTP server that echoes headers to the client", long_about = None)]
pub struct CliArgs {
    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Host to bind (empty binds all interfaces)
    #[arg(long, default_value = "")]
    pub host: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl CliArgs {
    /// Host as shown in the startup banner
    pub fn display_host(&self) -> &str {
        if self.host.is_empty() {
            "INADDR_ANY"
        } else {
            &self.host
        }
    }

    pub async fn to_config(&self) -> Result<HttpConfig> {
        Ok(HttpConfig {
            bind_addr: resolve_bind_addr(&self.host, self.port).await?,
            ..HttpConfig::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["echo-headers"]).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.host, "");
        assert_eq!(args.display_host(), "INADDR_ANY");
    }

    #[test]
    fn test_host_and_port() {
        let args =
            CliArgs::try_parse_from(["echo-headers", "--port", "9090", "--host", "127.0.0.1"])
                .unwrap();
        assert_eq!(args.port, 9090);
        assert_eq!(args.display_host(), "127.0.0.1");
    }

    #[test]
    fn test_rejects_non_numeric_port() {
        assert!(CliArgs::try_parse_from(["echo-headers", "--port", "http"]).is_err());
    }

    #[tokio::test]
    async fn test_to_config() {
        let args = CliArgs::try_parse_from(["echo-headers", "--port", "0", "--host", "127.0.0.1"])
            .unwrap();
        let config = args.to_config().await.unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:0".parse().unwrap());
    }
}
