use crate::{
    commands::{command_error::CommandError, stream_utils::entries_to_resp},
    key_value_store::KeyValueStore,
    resp::RespValue,
    stream::StreamId,
};

pub struct XrangeArguments {
    key: String,
    start: StreamId,
    end: StreamId,
    count: Option<usize>,
}

impl XrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 && arguments.len() != 5 {
            return Err(CommandError::WrongNumberOfArguments("xrange"));
        }

        let start = StreamId::parse_range_bound(&arguments[1], true)?;
        let end = StreamId::parse_range_bound(&arguments[2], false)?;

        let count = if arguments.len() == 5 {
            if !arguments[3].eq_ignore_ascii_case("count") {
                return Err(CommandError::SyntaxError);
            }

            let count = arguments[4]
                .parse::<i64>()
                .map_err(|_| CommandError::NotAnInteger)?;

            // A negative count selects nothing.
            Some(count.max(0) as usize)
        } else {
            None
        };

        Ok(Self {
            key: arguments[0].clone(),
            start,
            end,
            count,
        })
    }
}

/// Handles the Redis XRANGE command.
///
/// Replies with the entries whose ids fall within `[start, end]`, oldest
/// first, optionally capped by `COUNT`.
///
/// # Examples
///
/// ```ignore
/// // XADD readings 1-0 temp 20
/// // XADD readings 2-0 temp 21
/// // XRANGE readings - +
/// // Returns: [["1-0", ["temp", "20"]], ["2-0", ["temp", "21"]]]
///
/// // XRANGE readings 2 + COUNT 1
/// // Returns: [["2-0", ["temp", "21"]]]
/// ```
pub fn xrange(store: &KeyValueStore, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let entries = store.stream_range(
        &xrange_arguments.key,
        xrange_arguments.start,
        xrange_arguments.end,
        xrange_arguments.count,
    )?;

    Ok(entries_to_resp(entries))
}
