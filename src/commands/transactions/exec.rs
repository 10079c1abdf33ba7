use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError,
        command_handler::{CommandHandler, CommandResult},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    server::ServerConfig,
    state::State,
};

pub struct ExecArguments;

impl ExecArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::WrongArity("exec"));
        }

        Ok(Self)
    }
}

/// Handles the EXEC command: takes the connection's queued commands and
/// hands them back as a batch for replay. An empty queue replies with an
/// empty (present) array.
pub async fn exec(
    client_address: &str,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    ExecArguments::parse(arguments)?;

    let mut state_guard = state.lock().await;

    let Ok(transaction) = state_guard.remove_transaction(client_address) else {
        return Err(CommandError::ExecWithoutMulti);
    };

    if transaction.is_empty() {
        Ok(CommandResult::Response(
            RespValue::Array(Vec::new()).encode(),
        ))
    } else {
        Ok(CommandResult::Batch(transaction))
    }
}

/// Replays the queued commands of an EXEC in order, collecting each
/// reply (errors included, encoded inline) into one response array.
/// Suspending commands go through their non-blocking variants here, so
/// a transaction can never leave the client suspended.
pub async fn run_transaction_commands(
    client_address: &str,
    config: Arc<ServerConfig>,
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    commands: Vec<CommandHandler>,
) -> String {
    let mut responses = Vec::with_capacity(commands.len() + 1);
    responses.push(format!("*{}\r\n", commands.len()));

    for command in commands {
        match command
            .handle_transaction_command(
                client_address,
                Arc::clone(&config),
                Arc::clone(&store),
                Arc::clone(&state),
            )
            .await
        {
            Ok(CommandResult::Response(response)) => responses.push(response),
            // The queue gate keeps transaction commands out, so a batch
            // can never show up while replaying one.
            Ok(CommandResult::Batch(_)) => {
                responses.push(CommandError::InvalidCommand.as_string())
            }
            Err(err) => responses.push(err.as_string()),
        }
    }

    responses.join("")
}
