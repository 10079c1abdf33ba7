use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Represents the parsed arguments for the LRANGE command.
///
/// Both indices may be negative to count from the end of the list; the
/// range is inclusive on both sides.
pub struct LrangeArguments {
    key: String,
    start_index: isize,
    end_index: isize,
}

impl LrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::WrongArity("lrange"));
        }

        let Ok(start_index) = arguments[1].parse::<isize>() else {
            return Err(CommandError::InvalidLRangeCommandArgument);
        };

        let Ok(end_index) = arguments[2].parse::<isize>() else {
            return Err(CommandError::InvalidLRangeCommandArgument);
        };

        Ok(Self {
            key: arguments[0].clone(),
            start_index,
            end_index,
        })
    }
}

/// Handles the LRANGE command. An absent key or an out-of-range window
/// yields an empty array; the empty array is a real `*0` reply, never
/// the null sentinel.
pub async fn lrange(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let range = store_guard.range(
        &lrange_arguments.key,
        lrange_arguments.start_index,
        lrange_arguments.end_index,
    )?;

    if range.is_empty() {
        return Ok(CommandResult::Response(
            RespValue::Array(Vec::new()).encode(),
        ));
    }

    Ok(CommandResult::Response(RespValue::encode_array_from_strings(
        range,
    )))
}
