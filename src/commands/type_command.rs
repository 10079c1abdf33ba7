use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct TypeArguments {
    key: String,
}

impl TypeArguments {
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongArity("type"));
        }

        Ok(Self {
            key: arguments.remove(0),
        })
    }
}

/// Handles the TYPE command: the name of the stored type, or `none` for
/// an absent key.
pub async fn type_command(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let type_arguments = TypeArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let type_name = store_guard.type_name(&type_arguments.key);

    Ok(CommandResult::Response(
        RespValue::BulkString(type_name.to_string()).encode(),
    ))
}
