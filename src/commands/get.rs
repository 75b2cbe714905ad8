use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
};

pub struct GetArguments {
    key: String,
}

impl GetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongNumberOfArguments("get"));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Handles the Redis GET command.
///
/// Returns the string stored at the key, or null when the key is absent or
/// has expired (an expired key is removed as a side effect).
///
/// # Returns
///
/// * `Ok(RespValue::BulkString)` - The stored value
/// * `Ok(RespValue::Null)` - Key missing or expired
/// * `Err(CommandError::WrongType)` - The key holds a list or stream
/// * `Err(CommandError::WrongNumberOfArguments)` - Not exactly one argument
pub fn get(store: &KeyValueStore, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    match store.get_string(&get_arguments.key)? {
        Some(value) => Ok(RespValue::BulkString(value)),
        None => Ok(RespValue::Null),
    }
}
