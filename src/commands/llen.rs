use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct LlenArguments {
    key: String,
}

impl LlenArguments {
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongArity("llen"));
        }

        Ok(Self {
            key: arguments.remove(0),
        })
    }
}

/// Handles the LLEN command: the length of the list, 0 for an absent
/// key, WrongType for anything else.
pub async fn llen(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let llen_arguments = LlenArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let length = store_guard.list_len(&llen_arguments.key)?;

    Ok(CommandResult::Response(
        RespValue::Integer(length as i64).encode(),
    ))
}
