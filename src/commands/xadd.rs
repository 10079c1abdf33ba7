use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::{KeyValueStore, StreamFields},
    resp::RespValue,
    state::State,
};

/// Represents the parsed arguments for the XADD command.
///
/// `XADD key id field value [field value ...]`: the id may be a literal
/// `ts-seq`, a partial wildcard `ts-*`, or the full wildcard `*`.
pub struct XaddArguments {
    key: String,
    requested_id: String,
    fields: StreamFields,
}

impl XaddArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || arguments.len() % 2 != 0 {
            return Err(CommandError::WrongArity("xadd"));
        }

        let fields = arguments[2..]
            .chunks(2)
            .map(|chunk| (chunk[0].clone(), chunk[1].clone()))
            .collect::<StreamFields>();

        Ok(Self {
            key: arguments[0].clone(),
            requested_id: arguments[1].clone(),
            fields,
        })
    }
}

/// Handles the XADD command: resolves the requested id against the
/// stream's last id, appends the entry, and wakes every XREAD waiter
/// registered on the key so each can re-evaluate its wait-set.
pub async fn xadd(
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let resolved_id = store_guard.add_stream_entry(
        &xadd_arguments.key,
        &xadd_arguments.requested_id,
        xadd_arguments.fields,
    )?;
    drop(store_guard);

    let mut state_guard = state.lock().await;
    state_guard.notify_stream_waiters(&xadd_arguments.key);

    Ok(CommandResult::Response(
        RespValue::BulkString(resolved_id.to_string()).encode(),
    ))
}
