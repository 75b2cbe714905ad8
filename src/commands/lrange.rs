use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
};

pub struct LrangeArguments {
    key: String,
    start: i64,
    stop: i64,
}

impl LrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::WrongNumberOfArguments("lrange"));
        }

        let start = arguments[1]
            .parse::<i64>()
            .map_err(|_| CommandError::NotAnInteger)?;
        let stop = arguments[2]
            .parse::<i64>()
            .map_err(|_| CommandError::NotAnInteger)?;

        Ok(Self {
            key: arguments[0].clone(),
            start,
            stop,
        })
    }
}

/// Handles the Redis LRANGE command.
///
/// Both indexes are inclusive and may be negative, counting from the tail.
/// Out of range indexes are clamped to the list, and a missing key reads as
/// an empty list.
///
/// # Examples
///
/// ```ignore
/// // RPUSH fruits apple banana cherry
/// // LRANGE fruits 0 -2
/// // Returns: ["apple", "banana"]
/// ```
pub fn lrange(store: &KeyValueStore, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let elements = store.list_range(
        &lrange_arguments.key,
        lrange_arguments.start,
        lrange_arguments.stop,
    )?;

    Ok(RespValue::array_of_bulk_strings(elements))
}
