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

/// How a command interacts with the dispatch loop. Resolved once from
/// the command name, never re-derived per execution step.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum HandlerKind {
    /// Computes and returns a response synchronously.
    Immediate,
    /// May complete immediately or park the client on a waiter.
    Suspending,
    /// Operates on the connection's transaction state.
    Transactional,
}

impl HandlerKind {
    pub fn resolve(name: &str) -> Option<HandlerKind> {
        match name {
            "PING" | "ECHO" | "GET" | "SET" | "DEL" | "INCR" | "TYPE" | "RPUSH" | "LPUSH"
            | "LRANGE" | "LLEN" | "LPOP" | "XADD" | "XRANGE" | "INFO" | "COMMAND" => {
                Some(HandlerKind::Immediate)
            }
            "BLPOP" | "XREAD" => Some(HandlerKind::Suspending),
            "MULTI" | "EXEC" | "DISCARD" => Some(HandlerKind::Transactional),
            _ => None,
        }
    }
}

/// The result of dispatching one command.
#[derive(Debug, PartialEq)]
pub enum DispatchResult {
    /// A wire-encoded reply ready to be written out.
    ImmediateResponse(String),
    /// Queued commands of an EXEC, to be replayed by the caller.
    ExecuteTransactionCommands(Vec<CommandHandler>),
}

/// Routes decoded commands for one connection: rejects unknown names,
/// queues commands while the connection's transaction is open, and
/// executes everything else.
pub struct CommandDispatcher {
    pub client_address: String,
    pub state: Arc<Mutex<State>>,
}

impl CommandDispatcher {
    pub fn new(client_address: &str, state: Arc<Mutex<State>>) -> Self {
        CommandDispatcher {
            client_address: client_address.to_string(),
            state,
        }
    }

    /// Dispatches one command.
    ///
    /// While the connection is queuing a transaction, every command
    /// except MULTI/EXEC/DISCARD is validated, appended verbatim to the
    /// queue and answered `QUEUED` without executing. Otherwise the
    /// command runs: Immediate and Suspending handlers produce a reply
    /// (the latter possibly after parking), Transactional handlers
    /// mutate transaction state, and EXEC hands back its batch.
    pub async fn dispatch_command(
        &self,
        command: CommandHandler,
        config: Arc<ServerConfig>,
        store: Arc<Mutex<KeyValueStore>>,
    ) -> Result<DispatchResult, CommandError> {
        let Some(kind) = HandlerKind::resolve(command.name.as_str()) else {
            return Err(CommandError::UnknownCommand(command.name.clone()));
        };

        if kind != HandlerKind::Transactional {
            let mut state_guard = self.state.lock().await;

            if state_guard.is_in_transaction(&self.client_address) {
                if let Some(err) = command.validate_command_arguments() {
                    return Err(err);
                }

                state_guard.add_to_transaction(self.client_address.clone(), command)?;

                return Ok(DispatchResult::ImmediateResponse(
                    RespValue::SimpleString("QUEUED".to_string()).encode(),
                ));
            }
        }

        let result = command
            .handle_command(
                config,
                &self.client_address,
                store,
                Arc::clone(&self.state),
            )
            .await?;

        match result {
            CommandResult::Response(response) => Ok(DispatchResult::ImmediateResponse(response)),
            CommandResult::Batch(commands) => {
                Ok(DispatchResult::ExecuteTransactionCommands(commands))
            }
        }
    }
}
