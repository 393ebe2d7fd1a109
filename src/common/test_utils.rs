use crate::common::EchoServerTrait;
use crate::http::{HttpConfig, HttpEchoServer};
use crate::Result;
use std::net::SocketAddr;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Starts an HTTP echo server on an ephemeral loopback port
///
/// Returns the server task, the bound address and the sender that stops it.
pub async fn spawn_test_server(
    config: HttpConfig,
) -> Result<(JoinHandle<Result<()>>, SocketAddr, broadcast::Sender<()>)> {
    let config = HttpConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        ..config
    };

    let server = HttpEchoServer::bind(config).await?;
    let addr = server.local_addr()?;
    let shutdown = server.shutdown_signal();

    let server_handle = tokio::spawn(async move { server.run().await });

    Ok((server_handle, addr, shutdown))
}
