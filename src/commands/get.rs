use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Represents the parsed arguments for the GET command.
pub struct GetArguments {
    /// The key name to retrieve from the store
    key: String,
}

impl GetArguments {
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongArity("get"));
        }

        Ok(Self {
            key: arguments.remove(0),
        })
    }
}

/// Handles the GET command: the stored string as a bulk string, a null
/// bulk string for an absent (or expired) key, and a WrongType error for
/// a key holding anything else.
pub async fn get(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;

    match store_guard.get(&get_arguments.key)? {
        Some(value) => Ok(CommandResult::Response(
            RespValue::BulkString(value).encode(),
        )),
        None => Ok(CommandResult::Response(RespValue::NullBulkString.encode())),
    }
}
