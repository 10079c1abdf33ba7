use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct LpopArguments {
    key: String,
    count: Option<usize>,
}

impl LpopArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 2 {
            return Err(CommandError::WrongArity("lpop"));
        }

        let count = match arguments.get(1) {
            Some(raw) => Some(
                raw.parse::<usize>()
                    .map_err(|_| CommandError::InvalidLPopCommandArgument)?,
            ),
            None => None,
        };

        Ok(Self {
            key: arguments[0].clone(),
            count,
        })
    }
}

/// Handles the LPOP command: removes one element (or up to `count`
/// elements) from the front of the list. An absent key replies with the
/// null sentinel matching the requested shape.
pub async fn lpop(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let popped = store_guard.pop_front(&lpop_arguments.key, lpop_arguments.count.unwrap_or(1))?;

    let response = match (popped, lpop_arguments.count) {
        (None, None) => RespValue::NullBulkString.encode(),
        (None, Some(_)) => RespValue::NullArray.encode(),
        (Some(values), None) => match values.into_iter().next() {
            Some(value) => RespValue::BulkString(value).encode(),
            None => RespValue::NullBulkString.encode(),
        },
        (Some(values), Some(_)) => RespValue::encode_array_from_strings(values),
    };

    Ok(CommandResult::Response(response))
}
