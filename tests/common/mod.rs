use std::sync::Arc;

use tokio::sync::Mutex;

use tidepool::{
    commands::{
        run_transaction_commands, CommandDispatcher, CommandHandler, DispatchResult,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    server::ServerConfig,
    state::State,
};

/// Test environment holding the shared pieces a connection would see.
pub struct TestEnv {
    pub config: Arc<ServerConfig>,
    pub store: Arc<Mutex<KeyValueStore>>,
    pub state: Arc<Mutex<State>>,
}

impl TestEnv {
    pub fn new() -> Self {
        TestEnv {
            config: Arc::new(ServerConfig::default()),
            store: Arc::new(Mutex::new(KeyValueStore::new())),
            state: Arc::new(Mutex::new(State::new())),
        }
    }

    /// Clones the environment for use in spawned tasks.
    pub fn clone_env(&self) -> Self {
        TestEnv {
            config: Arc::clone(&self.config),
            store: Arc::clone(&self.store),
            state: Arc::clone(&self.state),
        }
    }

    /// Builds the RESP frame a client would send for `parts`.
    pub fn command(parts: &[&str]) -> RespValue {
        RespValue::Array(
            parts
                .iter()
                .map(|part| RespValue::BulkString(part.to_string()))
                .collect(),
        )
    }

    /// Dispatches one command as `client_address` and returns the wire
    /// reply, exactly as the connection loop would produce it.
    pub async fn exec(&self, client_address: &str, parts: &[&str]) -> String {
        let dispatcher = CommandDispatcher::new(client_address, Arc::clone(&self.state));
        let command = CommandHandler::new(Self::command(parts)).unwrap();

        match dispatcher
            .dispatch_command(command, Arc::clone(&self.config), Arc::clone(&self.store))
            .await
        {
            Ok(DispatchResult::ImmediateResponse(response)) => response,
            Ok(DispatchResult::ExecuteTransactionCommands(commands)) => {
                run_transaction_commands(
                    client_address,
                    Arc::clone(&self.config),
                    Arc::clone(&self.store),
                    Arc::clone(&self.state),
                    commands,
                )
                .await
            }
            Err(err) => err.as_string(),
        }
    }
}
