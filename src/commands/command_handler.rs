use std::sync::Arc;

use tracing::debug;

use crate::{
    commands::{
        blpop::blpop,
        command_error::CommandError,
        echo::echo,
        get::get,
        llen::llen,
        lpop::lpop,
        lrange::lrange,
        ping::ping,
        rpush_and_lpush::{lpush, rpush},
        set::set,
        type_command::type_command,
        xadd::xadd,
        xrange::xrange,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    state::BlockingRegistry,
};

/// A decoded request: the command name and its arguments.
#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    /// Spelled as the client sent it; matched case-insensitively.
    pub name: String,
    pub arguments: Vec<String>,
}

impl CommandHandler {
    /// Builds a handler from a request frame, which must be a non-empty array
    /// of bulk strings.
    ///
    /// # Examples
    ///
    /// ```
    /// use redis_lite::{commands::CommandHandler, resp::RespValue};
    ///
    /// let handler = CommandHandler::new(RespValue::array_of_bulk_strings(["get", "fruit"])).unwrap();
    /// assert_eq!(handler.name, "get");
    /// assert_eq!(handler.arguments, vec!["fruit".to_string()]);
    /// ```
    pub fn new(input: RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = input else {
            return Err(CommandError::InvalidCommand);
        };

        let mut strings = Vec::with_capacity(elements.len());

        for element in elements {
            let RespValue::BulkString(s) = element else {
                return Err(CommandError::InvalidCommand);
            };

            strings.push(s);
        }

        if strings.is_empty() {
            return Err(CommandError::InvalidCommand);
        }

        let name = strings.remove(0);

        Ok(Self {
            name,
            arguments: strings,
        })
    }

    /// Runs the command against the shared store and blocking registry.
    ///
    /// Only BLPOP can suspend; every other command completes without awaiting.
    pub async fn handle_command(
        &self,
        client_address: &str,
        store: Arc<KeyValueStore>,
        registry: Arc<BlockingRegistry>,
    ) -> Result<RespValue, CommandError> {
        debug!(command = %self.name, arguments = ?self.arguments, client = client_address);

        match self.name.to_ascii_uppercase().as_str() {
            "PING" => ping(self.arguments.clone()),
            "ECHO" => echo(self.arguments.clone()),
            "SET" => set(&store, self.arguments.clone()),
            "GET" => get(&store, self.arguments.clone()),
            "TYPE" => type_command(&store, self.arguments.clone()),
            "RPUSH" => rpush(&store, &registry, self.arguments.clone()),
            "LPUSH" => lpush(&store, &registry, self.arguments.clone()),
            "LPOP" => lpop(&store, self.arguments.clone()),
            "LRANGE" => lrange(&store, self.arguments.clone()),
            "LLEN" => llen(&store, self.arguments.clone()),
            "BLPOP" => blpop(client_address, store, registry, self.arguments.clone()).await,
            "XADD" => xadd(&store, self.arguments.clone()),
            "XRANGE" => xrange(&store, self.arguments.clone()),
            _ => Err(CommandError::UnknownCommand(self.name.clone())),
        }
    }
}
