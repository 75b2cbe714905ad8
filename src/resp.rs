//! RESP value model: encoding replies and incrementally decoding frames.

use bytes::{Buf, BytesMut};
use thiserror::Error;

/// Errors raised while decoding RESP frames from the wire.
#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("unknown RESP type '{0}'")]
    UnknownRespType(char),
    #[error("failed to parse integer")]
    FailedToParseInteger,
    #[error("invalid bulk string")]
    InvalidBulkString,
    #[error("invalid array")]
    InvalidArray,
    #[error("frame of {0} bytes exceeds the maximum frame size")]
    FrameTooLarge(usize),
    #[error("{0}")]
    Io(String),
}

impl From<std::io::Error> for RespError {
    fn from(err: std::io::Error) -> Self {
        RespError::Io(err.to_string())
    }
}

/// A single RESP value, used both for decoded requests and encoded replies.
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(String),
    Null,
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Encodes the value into its wire representation.
    ///
    /// # Examples
    ///
    /// ```
    /// use redis_lite::resp::RespValue;
    ///
    /// assert_eq!(RespValue::SimpleString("PONG".to_string()).encode(), "+PONG\r\n");
    /// assert_eq!(RespValue::BulkString("hey".to_string()).encode(), "$3\r\nhey\r\n");
    /// assert_eq!(RespValue::Null.encode(), "$-1\r\n");
    /// ```
    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(s) => format!("+{}\r\n", s),
            RespValue::Error(msg) => format!("-{}\r\n", msg),
            RespValue::Integer(i) => format!(":{}\r\n", i),
            RespValue::BulkString(s) => format!("${}\r\n{}\r\n", s.len(), s),
            RespValue::Null => "$-1\r\n".to_string(),
            RespValue::Array(elements) => {
                let mut encoded = format!("*{}\r\n", elements.len());

                for element in elements {
                    encoded.push_str(&element.encode());
                }

                encoded
            }
        }
    }

    /// Builds an array of bulk strings.
    pub fn array_of_bulk_strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RespValue::Array(
            items
                .into_iter()
                .map(|item| RespValue::BulkString(item.into()))
                .collect(),
        )
    }

    /// Attempts to decode one complete frame from the front of `buffer`.
    ///
    /// Returns `Ok(None)` without consuming anything when the buffer holds only
    /// part of a frame. On success the bytes of the decoded frame are removed.
    pub fn parse(buffer: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        match decode_at(buffer, 0, 0)? {
            Some((value, consumed)) => {
                buffer.advance(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

/// Arrays nested deeper than this are rejected.
const MAX_NESTING_DEPTH: usize = 32;

/// Decodes a value starting at `position`, returning it along with the
/// position just past its last byte. `depth` counts the enclosing arrays.
fn decode_at(
    buffer: &[u8],
    position: usize,
    depth: usize,
) -> Result<Option<(RespValue, usize)>, RespError> {
    let Some((line, next)) = read_line(buffer, position)? else {
        return Ok(None);
    };

    let Some(prefix) = line.chars().next() else {
        return Err(RespError::UnknownRespType(' '));
    };
    let content = &line[prefix.len_utf8()..];

    match prefix {
        '+' => Ok(Some((RespValue::SimpleString(content.to_string()), next))),
        '-' => Ok(Some((RespValue::Error(content.to_string()), next))),
        ':' => {
            let value = content
                .parse::<i64>()
                .map_err(|_| RespError::FailedToParseInteger)?;

            Ok(Some((RespValue::Integer(value), next)))
        }
        '$' => {
            let length = content
                .parse::<i64>()
                .map_err(|_| RespError::InvalidBulkString)?;

            if length == -1 {
                return Ok(Some((RespValue::Null, next)));
            }

            let length = usize::try_from(length).map_err(|_| RespError::InvalidBulkString)?;
            let end = next + length;

            if buffer.len() < end + 2 {
                return Ok(None);
            }

            if &buffer[end..end + 2] != b"\r\n" {
                return Err(RespError::InvalidBulkString);
            }

            let data = std::str::from_utf8(&buffer[next..end]).map_err(|_| RespError::InvalidUtf8)?;

            Ok(Some((RespValue::BulkString(data.to_string()), end + 2)))
        }
        '*' => {
            if depth >= MAX_NESTING_DEPTH {
                return Err(RespError::InvalidArray);
            }

            let length = content
                .parse::<i64>()
                .map_err(|_| RespError::InvalidArray)?;

            if length == -1 {
                return Ok(Some((RespValue::Null, next)));
            }

            let length = usize::try_from(length).map_err(|_| RespError::InvalidArray)?;
            let mut elements = Vec::with_capacity(length.min(1024));
            let mut cursor = next;

            for _ in 0..length {
                let Some((element, after)) = decode_at(buffer, cursor, depth + 1)? else {
                    return Ok(None);
                };

                elements.push(element);
                cursor = after;
            }

            Ok(Some((RespValue::Array(elements), cursor)))
        }
        other => Err(RespError::UnknownRespType(other)),
    }
}

/// Reads a CRLF-terminated line starting at `position`.
fn read_line(buffer: &[u8], position: usize) -> Result<Option<(&str, usize)>, RespError> {
    if position >= buffer.len() {
        return Ok(None);
    }

    let Some(offset) = buffer[position..]
        .windows(2)
        .position(|window| window == b"\r\n")
    else {
        return Ok(None);
    };

    let line = std::str::from_utf8(&buffer[position..position + offset])
        .map_err(|_| RespError::InvalidUtf8)?;

    Ok(Some((line, position + offset + 2)))
}
