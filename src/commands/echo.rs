use crate::{commands::command_error::CommandError, resp::RespValue};

pub struct EchoArguments {
    message: String,
}

impl EchoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [message]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::WrongNumberOfArguments("echo"))?;

        Ok(Self { message })
    }
}

/// Handles the Redis ECHO command.
///
/// Returns the exact string provided as its single argument.
///
/// # Examples
///
/// ```ignore
/// // ECHO "hello world"
/// let result = echo(vec!["hello world".to_string()]);
/// // Returns: RespValue::BulkString("hello world")
/// ```
pub fn echo(arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let echo_arguments = EchoArguments::parse(arguments)?;

    Ok(RespValue::BulkString(echo_arguments.message))
}
