use crate::{resp::RespValue, stream::StreamEntry};

/// Converts stream entries to the RESP layout used by XRANGE.
///
/// Each entry becomes a 2-element array: `[id, [field1, value1, field2, value2, ...]]`.
///
/// # Examples
///
/// ```
/// use redis_lite::{commands::stream_utils::entries_to_resp, resp::RespValue, stream::{StreamEntry, StreamId}};
///
/// let entry = StreamEntry::new(StreamId::new(1, 0), &["temp".to_string(), "25".to_string()]);
/// assert_eq!(
///     entries_to_resp(vec![entry]).encode(),
///     "*1\r\n*2\r\n$3\r\n1-0\r\n*2\r\n$4\r\ntemp\r\n$2\r\n25\r\n"
/// );
/// ```
pub fn entries_to_resp(entries: Vec<StreamEntry>) -> RespValue {
    RespValue::Array(
        entries
            .into_iter()
            .map(|entry| {
                let fields = entry
                    .fields
                    .into_iter()
                    .flat_map(|(field, value)| [field, value]);

                RespValue::Array(vec![
                    RespValue::BulkString(entry.id.to_string()),
                    RespValue::array_of_bulk_strings(fields),
                ])
            })
            .collect(),
    )
}
