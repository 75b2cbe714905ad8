use std::{sync::Arc, time::Duration};

use crate::{
    commands::command_error::CommandError,
    key_value_store::KeyValueStore,
    resp::RespValue,
    state::{BlockingRegistry, BlpopOutcome},
};

pub struct BlpopArguments {
    keys: Vec<String>,
    /// `None` blocks indefinitely.
    timeout: Option<Duration>,
}

impl BlpopArguments {
    /// Parses `key [key ...] timeout`, where the timeout is in seconds and may
    /// be fractional. A timeout of `0` blocks indefinitely and a negative one
    /// expires immediately.
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::WrongNumberOfArguments("blpop"));
        }

        let seconds = arguments
            .pop()
            .unwrap_or_default()
            .parse::<f64>()
            .map_err(|_| CommandError::InvalidTimeout)?;

        if !seconds.is_finite() {
            return Err(CommandError::InvalidTimeout);
        }

        let timeout = if seconds == 0.0 {
            None
        } else if seconds < 0.0 {
            Some(Duration::ZERO)
        } else {
            Some(
                Duration::try_from_secs_f64(seconds).map_err(|_| CommandError::InvalidTimeout)?,
            )
        };

        Ok(Self {
            keys: arguments,
            timeout,
        })
    }
}

/// Handles the Redis BLPOP command.
///
/// Pops the head of the first non-empty list among the keys, scanned in
/// argument order. When every list is empty the client is parked on the
/// first key until a push to that key hands it an element or the timeout
/// elapses.
///
/// # Arguments
///
/// * `client_address` - Address of the issuing client, used for logging
/// * `store` - The shared key-value store
/// * `registry` - Where the client waits while blocked
/// * `arguments` - `[key, ..., timeout]`
///
/// # Returns
///
/// * `Ok(RespValue::Array)` - `[key, element]` once an element is available
/// * `Ok(RespValue::Null)` - The timeout elapsed first
/// * `Err(CommandError::WrongType)` - A scanned key holds a string or stream
/// * `Err(CommandError::InvalidTimeout)` - The timeout is not a finite float
///
/// # Examples
///
/// ```ignore
/// // Client A: BLPOP queue 0      (blocks)
/// // Client B: RPUSH queue job1   (replies 1)
/// // Client A receives: ["queue", "job1"]
/// ```
pub async fn blpop(
    client_address: &str,
    store: Arc<KeyValueStore>,
    registry: Arc<BlockingRegistry>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;

    let outcome = registry.pop_or_register(
        &store,
        &blpop_arguments.keys,
        client_address,
        blpop_arguments.timeout,
    )?;

    match outcome {
        BlpopOutcome::Ready { key, element } => Ok(RespValue::array_of_bulk_strings([key, element])),
        BlpopOutcome::Blocked(wait) => {
            let key = wait.key().to_string();

            match wait.wait().await {
                Some(element) => Ok(RespValue::array_of_bulk_strings([key, element])),
                None => Ok(RespValue::Null),
            }
        }
    }
}
