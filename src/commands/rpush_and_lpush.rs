use crate::{
    commands::command_error::CommandError,
    key_value_store::{KeyValueStore, ListEnd},
    resp::RespValue,
    state::BlockingRegistry,
};

pub struct PushArguments {
    key: String,
    values: Vec<String>,
}

impl PushArguments {
    pub fn parse(mut arguments: Vec<String>, command: &'static str) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::WrongNumberOfArguments(command));
        }

        let values = arguments.split_off(1);
        let key = arguments.remove(0);

        Ok(Self { key, values })
    }
}

/// Appends the values to the tail of the list, creating it if needed.
pub fn rpush(
    store: &KeyValueStore,
    registry: &BlockingRegistry,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    push(store, registry, PushArguments::parse(arguments, "rpush")?, ListEnd::Tail)
}

/// Prepends the values one at a time, so `LPUSH k a b c` leaves `c b a`.
pub fn lpush(
    store: &KeyValueStore,
    registry: &BlockingRegistry,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    push(store, registry, PushArguments::parse(arguments, "lpush")?, ListEnd::Head)
}

/// Shared by RPUSH and LPUSH.
///
/// The reply carries the length right after the push, before a blocked
/// client (if any) takes the head element.
fn push(
    store: &KeyValueStore,
    registry: &BlockingRegistry,
    push_arguments: PushArguments,
    end: ListEnd,
) -> Result<RespValue, CommandError> {
    let length = store.push_list(&push_arguments.key, &push_arguments.values, end)?;

    registry.wake_one(store, &push_arguments.key);

    Ok(RespValue::Integer(length as i64))
}
