use std::{collections::VecDeque, sync::Arc};

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, instrument, warn};

use crate::{
    codec::RespCodec,
    commands::CommandHandler,
    key_value_store::KeyValueStore,
    resp::{RespError, RespValue},
    state::BlockingRegistry,
};

type RespStream = Framed<TcpStream, RespCodec>;

/// Requests buffered behind a suspended command. Past this the socket is no
/// longer read until the command finishes.
pub const MAX_PENDING_REQUESTS: usize = 1024;

/// Serves a single client until it disconnects or sends a malformed frame.
///
/// Requests run strictly in arrival order. While a command is suspended in
/// BLPOP the socket keeps being read: requests that arrive meanwhile are
/// queued (up to [`MAX_PENDING_REQUESTS`]) and run once the blocked reply has
/// been written, and end-of-stream or a read error cancels the wait.
#[instrument(name = "connection", skip(stream, store, registry, max_frame_size))]
pub async fn handle_client_connection(
    stream: TcpStream,
    client_address: String,
    store: Arc<KeyValueStore>,
    registry: Arc<BlockingRegistry>,
    max_frame_size: usize,
) {
    let mut framed = Framed::new(stream, RespCodec::new(max_frame_size));
    let mut pending: VecDeque<RespValue> = VecDeque::new();

    loop {
        let frame = match pending.pop_front() {
            Some(frame) => frame,
            None => match framed.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(err)) => {
                    reject_malformed_input(&mut framed, err).await;
                    break;
                }
                None => break,
            },
        };

        let command_handler = match CommandHandler::new(frame) {
            Ok(handler) => handler,
            Err(err) => {
                if !write_reply(&mut framed, err.as_resp()).await {
                    break;
                }
                continue;
            }
        };

        let command = command_handler.handle_command(
            &client_address,
            Arc::clone(&store),
            Arc::clone(&registry),
        );
        tokio::pin!(command);

        let result = loop {
            tokio::select! {
                biased;
                result = &mut command => break Some(result),
                incoming = framed.next(), if pending.len() < MAX_PENDING_REQUESTS => match incoming {
                    Some(Ok(frame)) => pending.push_back(frame),
                    Some(Err(err)) => {
                        debug!(command = %command_handler.name, "read failed while blocked");
                        reject_malformed_input(&mut framed, err).await;
                        break None;
                    }
                    None => {
                        debug!(command = %command_handler.name, "client left while blocked");
                        break None;
                    }
                },
            }
        };

        // Leaving the loop without a result drops the suspended command,
        // which withdraws it from the blocking registry.
        let Some(result) = result else {
            break;
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(err) => err.as_resp(),
        };

        if !write_reply(&mut framed, reply).await {
            break;
        }
    }

    info!("connection closed");
}

async fn write_reply(framed: &mut RespStream, reply: RespValue) -> bool {
    match framed.send(reply).await {
        Ok(()) => true,
        Err(err) => {
            warn!(%err, "error writing to stream");
            false
        }
    }
}

/// Best-effort error reply before the connection is dropped.
async fn reject_malformed_input(framed: &mut RespStream, err: RespError) {
    if let RespError::Io(_) = err {
        warn!(%err, "error reading from stream");
        return;
    }

    warn!(%err, "protocol error");
    write_reply(framed, RespValue::Error(format!("ERR Protocol error: {}", err))).await;
}
