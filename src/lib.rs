//! An in-memory key-value server speaking the Redis serialization protocol.
//!
//! Supported commands:
//!
//! - Connection: PING, ECHO
//! - Strings: SET (with PX expiry), GET, TYPE
//! - Lists: RPUSH, LPUSH, LPOP, LRANGE, LLEN, BLPOP
//! - Streams: XADD, XRANGE
//!
//! Each client is served by its own Tokio task. Clients share a single
//! [`key_value_store::KeyValueStore`] and a [`state::BlockingRegistry`]
//! where BLPOP callers wait for pushes.

pub mod codec;
pub mod commands;
pub mod connection;
pub mod key_value_store;
pub mod resp;
pub mod server;
pub mod state;
pub mod stream;
