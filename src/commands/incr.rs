use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct IncrArguments {
    key: String,
}

impl IncrArguments {
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongArity("incr"));
        }

        Ok(Self {
            key: arguments.remove(0),
        })
    }
}

/// Handles the INCR command: parses the stored string as an integer and
/// stores the incremented value, creating the key at 1 when absent.
pub async fn incr(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let incr_arguments = IncrArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let updated = store_guard.increment(&incr_arguments.key)?;

    Ok(CommandResult::Response(RespValue::Integer(updated).encode()))
}
