use anyhow::Context;
use redis_lite::server::{CliError, RedisServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let server = match RedisServer::new(std::env::args()) {
        Ok(server) => server,
        Err(CliError::InvalidArguments(err)) => err.exit(),
    };

    let address = server.address();

    server
        .run()
        .await
        .with_context(|| format!("server on {} stopped", address))
}
