use thiserror::Error;

use crate::{key_value_store::StoreError, resp::RespValue, state::StateError};

/// Failures produced while parsing or executing a command. Every variant
/// encodes to a protocol error reply; none of them terminates the
/// connection.
#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("invalid command")]
    InvalidCommand,
    #[error("invalid command argument")]
    InvalidCommandArgument,
    #[error("Command {0} does not exist")]
    UnknownCommand(String),
    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),
    #[error("invalid SET command argument")]
    InvalidSetCommandArgument,
    #[error("invalid SET command expiration")]
    InvalidSetCommandExpiration,
    #[error("invalid LRANGE command argument")]
    InvalidLRangeCommandArgument,
    #[error("invalid LPOP command argument")]
    InvalidLPopCommandArgument,
    #[error("timeout is not a float or out of range")]
    InvalidBLPopTimeout,
    #[error("invalid XREAD command option")]
    InvalidXReadOption,
    #[error("invalid XREAD block duration")]
    InvalidXReadBlockDuration,
    #[error("Unbalanced XREAD list of streams: for each stream key an ID must be specified")]
    UnbalancedXRead,
    #[error("EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("DISCARD without MULTI")]
    DiscardWithoutMulti,
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Transaction(#[from] StateError),
}

impl CommandError {
    /// Encodes the error as a RESP error reply.
    pub fn as_string(&self) -> String {
        match self {
            // Store errors carry their own prefix (WRONGTYPE / ERR ...).
            CommandError::Store(err) => RespValue::Error(err.to_string()).encode(),
            _ => RespValue::Error(format!("ERR {}", self)).encode(),
        }
    }
}
