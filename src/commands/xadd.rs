use crate::{
    commands::command_error::CommandError,
    key_value_store::KeyValueStore,
    resp::RespValue,
    stream::StreamIdSpec,
};

pub struct XaddArguments {
    key: String,
    id_spec: StreamIdSpec,
    pairs: Vec<String>,
}

impl XaddArguments {
    /// Parses `key id field value [field value ...]`.
    ///
    /// The id may be explicit (`<ms>-<seq>`), have an auto-assigned sequence
    /// (`<ms>-*`) or be fully generated (`*`). A bare `<ms>` is rejected.
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || arguments.len() % 2 != 0 {
            return Err(CommandError::WrongNumberOfArguments("xadd"));
        }

        let pairs = arguments.split_off(2);
        let id_spec = arguments[1].parse::<StreamIdSpec>()?;

        Ok(Self {
            key: arguments[0].clone(),
            id_spec,
            pairs,
        })
    }
}

/// Handles the Redis XADD command.
///
/// Appends an entry to the stream at the key, creating the stream when the
/// key is absent, and replies with the id actually assigned.
///
/// # Returns
///
/// * `Ok(RespValue::BulkString)` - The entry id, e.g. `"1526919030474-0"`
/// * `Err(CommandError::InvalidStreamId)` - The id is malformed, `0-0`, or not
///   greater than the last entry's id
/// * `Err(CommandError::WrongType)` - The key holds a string or list
///
/// # Examples
///
/// ```ignore
/// // XADD sensor 1-1 temperature 36
/// // Returns: "1-1"
///
/// // XADD sensor 1-* humidity 95
/// // Returns: "1-2"
/// ```
pub fn xadd(store: &KeyValueStore, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;

    let id = store.append_stream(
        &xadd_arguments.key,
        xadd_arguments.id_spec,
        &xadd_arguments.pairs,
    )?;

    Ok(RespValue::BulkString(id.to_string()))
}
