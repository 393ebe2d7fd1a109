use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use echo_headers::EchoServerTrait;
use echo_headers::cli::CliArgs;
use echo_headers::http::HttpEchoServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = CliArgs::parse();

    // Initialize logging; stdout is reserved for the startup banner
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("echo_headers={}", args.log_level)))
        .wrap_err("Invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = args.to_config().await.wrap_err("Failed to resolve bind address")?;
    let server = HttpEchoServer::bind(config)
        .await
        .wrap_err("Failed to bind HTTP echo server")?;

    println!("Listening on {}:{}", args.display_host(), args.port);

    #[cfg(unix)]
    echo_headers::diagnostics::spawn_dump_listener(server.tracker())
        .wrap_err("Failed to install SIGUSR1 handler")?;

    info!(address = %server.local_addr()?, "Starting HTTP echo server");
    server.run().await.wrap_err("Failed to run HTTP echo server")?;

    Ok(())
}
