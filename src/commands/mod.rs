mod blpop;
mod command_docs;
mod command_dispatcher;
mod command_error;
mod command_handler;
mod del;
mod echo;
mod get;
mod incr;
mod info;
mod llen;
mod lpop;
mod lrange;
mod ping;
mod rpush_and_lpush;
mod set;
mod stream_utils;
mod transactions;
mod type_command;
mod xadd;
mod xrange;
mod xread;

pub use command_dispatcher::{CommandDispatcher, DispatchResult, HandlerKind};
pub use command_error::CommandError;
pub use command_handler::{CommandHandler, CommandResult};
pub use transactions::run_transaction_commands;
