use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
    state::State,
};

pub struct PushArguments {
    key: String,
    values: Vec<String>,
}

impl PushArguments {
    pub fn parse(
        mut arguments: Vec<String>,
        should_prepend: bool,
    ) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(if should_prepend {
                CommandError::WrongArity("lpush")
            } else {
                CommandError::WrongArity("rpush")
            });
        }

        let key = arguments.remove(0);

        Ok(Self {
            key,
            values: arguments,
        })
    }
}

/// Handles the RPUSH command: appends values to the back of the list,
/// creating it when absent, and wakes at most one blocked list waiter.
pub async fn rpush(
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    push(store, state, arguments, false).await
}

/// Handles the LPUSH command: pushes values to the front of the list one
/// at a time, creating it when absent, and wakes at most one blocked
/// list waiter.
pub async fn lpush(
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    push(store, state, arguments, true).await
}

async fn push(
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
    should_prepend: bool,
) -> Result<CommandResult, CommandError> {
    let push_arguments = PushArguments::parse(arguments, should_prepend)?;

    let mut store_guard = store.lock().await;
    let length = if should_prepend {
        store_guard.prepend(&push_arguments.key, push_arguments.values)?
    } else {
        store_guard.append(&push_arguments.key, push_arguments.values)?
    };
    drop(store_guard);

    let mut state_guard = state.lock().await;
    state_guard.notify_list_waiter(&push_arguments.key);

    Ok(CommandResult::Response(
        RespValue::Integer(length as i64).encode(),
    ))
}
