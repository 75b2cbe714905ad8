use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
};

pub struct LlenArguments {
    key: String,
}

impl LlenArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongNumberOfArguments("llen"));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

pub fn llen(store: &KeyValueStore, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let llen_arguments = LlenArguments::parse(arguments)?;

    let length = store.list_len(&llen_arguments.key)?;

    Ok(RespValue::Integer(length as i64))
}
