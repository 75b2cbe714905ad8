use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
};

pub struct LpopArguments {
    key: String,
    count: Option<usize>,
}

impl LpopArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 2 {
            return Err(CommandError::WrongNumberOfArguments("lpop"));
        }

        let count = match arguments.get(1) {
            Some(count) => {
                let count = count
                    .parse::<i64>()
                    .map_err(|_| CommandError::NotAnInteger)?;

                if count < 0 {
                    return Err(CommandError::NegativeCount);
                }

                Some(count as usize)
            }
            None => None,
        };

        Ok(Self {
            key: arguments[0].clone(),
            count,
        })
    }
}

/// Handles the Redis LPOP command.
///
/// Without a count, pops a single element and replies with it as a bulk
/// string. With a count, pops up to that many and replies with an array.
///
/// # Returns
///
/// * `Ok(RespValue::BulkString)` - The popped element (no count given)
/// * `Ok(RespValue::Array)` - The popped elements (count given)
/// * `Ok(RespValue::Null)` - Key missing, no count given
/// * `Ok(RespValue::Array(vec![]))` - Key missing, count given
/// * `Err(CommandError::WrongType)` - The key holds a string or stream
pub fn lpop(store: &KeyValueStore, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments)?;

    let popped = store.pop_list_front(&lpop_arguments.key, lpop_arguments.count.unwrap_or(1))?;

    match (lpop_arguments.count, popped) {
        (None, Some(mut elements)) if !elements.is_empty() => {
            Ok(RespValue::BulkString(elements.remove(0)))
        }
        (None, _) => Ok(RespValue::Null),
        (Some(_), Some(elements)) => Ok(RespValue::array_of_bulk_strings(elements)),
        (Some(_), None) => Ok(RespValue::Array(vec![])),
    }
}
