use thiserror::Error;

use crate::{key_value_store::StoreError, resp::RespValue, stream::StreamIdError};

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("invalid command")]
    InvalidCommand,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(&'static str),
    #[error("value is not an integer or out of range")]
    NotAnInteger,
    #[error("value is out of range, must be positive")]
    NegativeCount,
    #[error("syntax error")]
    SyntaxError,
    #[error("PX value must be integer")]
    InvalidSetExpiration,
    #[error("timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("{0}")]
    InvalidStreamId(#[from] StreamIdError),
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::WrongType => CommandError::WrongType,
            StoreError::InvalidStreamId(err) => CommandError::InvalidStreamId(err),
        }
    }
}

impl CommandError {
    /// The error reply sent to the client.
    pub fn as_resp(&self) -> RespValue {
        match self {
            CommandError::WrongType => RespValue::Error(format!("WRONGTYPE {}", self)),
            _ => RespValue::Error(format!("ERR {}", self)),
        }
    }
}
