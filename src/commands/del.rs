use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct DelArguments {
    keys: Vec<String>,
}

impl DelArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::WrongArity("del"));
        }

        Ok(Self { keys: arguments })
    }
}

/// Handles the DEL command: removes each named key that exists and
/// replies with the number removed.
pub async fn del(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let del_arguments = DelArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let removed = store_guard.delete(&del_arguments.keys);

    Ok(CommandResult::Response(
        RespValue::Integer(removed as i64).encode(),
    ))
}
