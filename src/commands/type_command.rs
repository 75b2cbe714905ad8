use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
};

pub struct TypeArguments {
    key: String,
}

impl TypeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongNumberOfArguments("type"));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

pub fn type_command(store: &KeyValueStore, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let type_arguments = TypeArguments::parse(arguments)?;

    let type_name = store.type_name(&type_arguments.key).unwrap_or("none");

    Ok(RespValue::SimpleString(type_name.to_string()))
}
