use std::{io, sync::Arc};

use clap::Parser;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{
    codec::DEFAULT_MAX_FRAME_SIZE, connection::handle_client_connection,
    key_value_store::KeyValueStore, state::BlockingRegistry,
};

pub const DEFAULT_PORT: u16 = 6379;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    InvalidArguments(#[from] clap::Error),
}

/// Command line configuration.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "redis-lite", version, about = "In-memory key-value server speaking RESP")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,
    /// The port to listen on
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_PORT,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub port: u16,
    /// Largest request frame accepted, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
}

#[derive(Debug)]
pub struct RedisServer {
    pub config: ServerConfig,
}

impl RedisServer {
    /// Builds a server from command line arguments. The first item is the
    /// program name, as with [`std::env::args`].
    ///
    /// # Examples
    ///
    /// ```
    /// use redis_lite::server::RedisServer;
    ///
    /// let server = RedisServer::new(["redis-lite", "--port", "7000"]).unwrap();
    /// assert_eq!(server.config.port, 7000);
    /// assert_eq!(server.config.bind, "127.0.0.1");
    /// ```
    pub fn new<I, T>(command_line_args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = ServerConfig::try_parse_from(command_line_args)?;

        Ok(Self { config })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.bind, self.config.port)
    }

    /// Binds the configured address and serves clients until the listener fails.
    pub async fn run(self) -> io::Result<()> {
        let listener = TcpListener::bind(self.address()).await?;

        serve(listener, self.config).await
    }
}

/// Accepts clients on an already bound listener, one task per connection.
/// Every connection shares the same store and blocking registry.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> io::Result<()> {
    let store = Arc::new(KeyValueStore::new());
    let registry = Arc::new(BlockingRegistry::new());

    info!("listening on {}", listener.local_addr()?);

    loop {
        let (stream, client_address) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(%err, "failed to accept connection");
                continue;
            }
        };

        info!(%client_address, "accepted new connection");

        let store = Arc::clone(&store);
        let registry = Arc::clone(&registry);
        let max_frame_size = config.max_frame_size;

        tokio::spawn(async move {
            handle_client_connection(
                stream,
                client_address.to_string(),
                store,
                registry,
                max_frame_size,
            )
            .await;
        });
    }
}
