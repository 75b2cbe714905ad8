use std::time::Duration;

use tokio::time::Instant;

use crate::{
    commands::command_error::CommandError,
    key_value_store::{DataType, KeyValueStore, Value},
    resp::RespValue,
};

/// Represents the parsed arguments for SET command
pub struct SetArguments {
    /// The key name to store the value under
    key: String,
    /// The value to be stored under the given key
    value: String,
    /// Time to live, if a `PX` option was given
    time_to_live: Option<Duration>,
}

impl SetArguments {
    /// Parses command arguments into a SetArguments structure.
    ///
    /// # Arguments
    ///
    /// * `arguments` - `[key, value, ...]`. The trailing arguments are scanned
    ///   for `PX <milliseconds>` (matched case-insensitively); any other token,
    ///   and a `PX` with nothing after it, is ignored. The last `PX` wins.
    ///
    /// # Returns
    ///
    /// * `Ok(SetArguments)` - Successfully parsed arguments. A zero or negative
    ///   `PX` gives a zero time to live, so the value is stored already expired
    /// * `Err(CommandError::WrongNumberOfArguments)` - Fewer than 2 arguments
    /// * `Err(CommandError::InvalidSetExpiration)` - The `PX` value is not an integer
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let result = SetArguments::parse(vec![
    ///     "mykey".to_string(),
    ///     "hello".to_string(),
    ///     "px".to_string(),
    ///     "1000".to_string(),
    /// ]);
    /// // Returns: Ok(SetArguments { key: "mykey", value: "hello", time_to_live: Some(1s) })
    /// ```
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::WrongNumberOfArguments("set"));
        }

        let mut time_to_live = None;
        let options = &arguments[2..];

        for (index, option) in options.iter().enumerate() {
            if !option.eq_ignore_ascii_case("px") {
                continue;
            }

            let Some(milliseconds) = options.get(index + 1) else {
                break;
            };

            let milliseconds = milliseconds
                .parse::<i64>()
                .map_err(|_| CommandError::InvalidSetExpiration)?;

            time_to_live = Some(Duration::from_millis(milliseconds.max(0) as u64));
        }

        Ok(Self {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            time_to_live,
        })
    }
}

/// Handles the Redis SET command.
///
/// Stores a string under the key, replacing any previous value of any type
/// and clearing any previous expiration.
///
/// # Returns
///
/// * `Ok(RespValue::SimpleString("OK"))` - The value was stored
/// * `Err(CommandError)` - See [`SetArguments::parse`]
pub fn set(store: &KeyValueStore, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    let data = DataType::String(set_arguments.value);
    let value = match set_arguments.time_to_live {
        Some(time_to_live) => Value::with_expiration(data, Instant::now() + time_to_live),
        None => Value::new(data),
    };

    store.set(set_arguments.key, value);

    Ok(RespValue::SimpleString("OK".to_string()))
}
