use super::config::HttpConfig;
use super::connection::HttpConnection;
use crate::common::EchoServerTrait;
use crate::diagnostics::ConnectionTracker;
use crate::{EchoError, Result};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn, Instrument};

/// HTTP echo server: one task per accepted connection
///
/// # Examples
///
/// ```no_run
/// use echo_headers::common::EchoServerTrait;
/// use echo_headers::http::{HttpConfig, HttpEchoServer};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = HttpConfig {
///         bind_addr: "127.0.0.1:8080".parse()?,
///         ..HttpConfig::default()
///     };
///
///     let server = HttpEchoServer::bind(config).await?;
///     server.run().await?;
///     Ok(())
/// }
/// ```
pub struct HttpEchoServer {
    config: Arc<HttpConfig>,
    listener: TcpListener,
    tracker: Arc<ConnectionTracker>,
    shutdown_signal: Arc<tokio::sync::broadcast::Sender<()>>,
}

impl HttpEchoServer {
    /// Binds the listening socket; connections are accepted once
    /// [`run`](EchoServerTrait::run) starts
    pub async fn bind(config: HttpConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|e| EchoError::Config(format!("Failed to bind {}: {e}", config.bind_addr)))?;
        let (shutdown_signal, _) = tokio::sync::broadcast::channel(1);

        Ok(Self {
            config: Arc::new(config),
            listener,
            tracker: Arc::new(ConnectionTracker::new()),
            shutdown_signal: Arc::new(shutdown_signal),
        })
    }

    /// The bound address, useful when binding port 0
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn tracker(&self) -> Arc<ConnectionTracker> {
        Arc::clone(&self.tracker)
    }

    fn spawn_connection(&self, stream: tokio::net::TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!(%addr, error = %e, "Failed to set TCP_NODELAY");
        }
        let guard = self.tracker.register(addr);
        let span = tracing::info_span!("connection", id = guard.id(), %addr);
        let connection = HttpConnection::new(stream, addr, Arc::clone(&self.config)).tracked(guard);

        tokio::spawn(
            async move {
                if let Err(e) = connection.serve().await {
                    warn!(%addr, error = %e, "Connection terminated");
                }
            }
            .instrument(span),
        );
    }
}

#[async_trait]
impl EchoServerTrait for HttpEchoServer {
    /// Accepts connections until Ctrl-C or an internal shutdown signal
    async fn run(&self) -> Result<()> {
        info!(address = %self.local_addr()?, "HTTP echo server listening");

        let mut shutdown_rx = self.shutdown_signal.subscribe();

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            info!(%addr, "Accepted connection");
                            self.spawn_connection(stream, addr);
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping server");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Received internal shutdown signal, stopping server");
                    break;
                }
            }
        }

        info!("HTTP echo server stopped");
        Ok(())
    }

    /// Returns a shutdown signal sender that can be used to stop the accept loop
    fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()> {
        self.shutdown_signal.as_ref().clone()
    }
}
