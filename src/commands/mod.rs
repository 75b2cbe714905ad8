mod blpop;
mod command_error;
mod command_handler;
mod echo;
mod get;
mod llen;
mod lpop;
mod lrange;
mod ping;
mod rpush_and_lpush;
mod set;
pub mod stream_utils;
mod type_command;
mod xadd;
mod xrange;

pub use command_error::CommandError;
pub use command_handler::CommandHandler;
