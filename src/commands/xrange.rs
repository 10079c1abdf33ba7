use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        stream_utils::stream_entries_to_resp,
    },
    key_value_store::KeyValueStore,
};

/// Represents the parsed arguments for the XRANGE command.
///
/// Bounds are inclusive; `-` means the smallest possible id, `+` the
/// largest, and a bare timestamp covers every sequence number within it.
pub struct XrangeArguments {
    key: String,
    start: String,
    end: String,
}

impl XrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::WrongArity("xrange"));
        }

        Ok(Self {
            key: arguments[0].clone(),
            start: arguments[1].clone(),
            end: arguments[2].clone(),
        })
    }
}

/// Handles the XRANGE command: the entries whose ids fall inside the
/// normalized window, in ascending id order.
pub async fn xrange(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let entries = store_guard.stream_range(
        &xrange_arguments.key,
        &xrange_arguments.start,
        &xrange_arguments.end,
    )?;

    Ok(CommandResult::Response(
        stream_entries_to_resp(&entries).encode(),
    ))
}
