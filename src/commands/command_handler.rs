use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{
        blpop::{blpop, blpop_immediate, BlpopArguments},
        command_docs::{command_docs, CommandDocsArguments},
        command_error::CommandError,
        del::{del, DelArguments},
        echo::{echo, EchoArguments},
        get::{get, GetArguments},
        incr::{incr, IncrArguments},
        info::{info, InfoArguments},
        llen::{llen, LlenArguments},
        lpop::{lpop, LpopArguments},
        lrange::{lrange, LrangeArguments},
        ping::{ping, PingArguments},
        rpush_and_lpush::{lpush, rpush, PushArguments},
        set::{set, SetArguments},
        transactions::{discard, exec, multi, DiscardArguments, ExecArguments, MultiArguments},
        type_command::{type_command, TypeArguments},
        xadd::{xadd, XaddArguments},
        xrange::{xrange, XrangeArguments},
        xread::{xread, xread_immediate, XreadArguments},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    server::ServerConfig,
    state::State,
};

/// The outcome of executing one command.
#[derive(Debug, PartialEq, Clone)]
pub enum CommandResult {
    /// A wire-encoded reply to send to the client.
    Response(String),
    /// Queued transaction commands an EXEC handed back for replay.
    Batch(Vec<CommandHandler>),
}

/// A decoded command: its upper-cased name and raw string arguments.
#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub arguments: Vec<String>,
}

impl CommandHandler {
    /// Builds a command from a decoded frame. Only an array of bulk
    /// strings whose first element names the command is accepted.
    pub fn new(input: RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = input else {
            return Err(CommandError::InvalidCommand);
        };

        let name = match elements.first() {
            Some(RespValue::BulkString(s)) => s.to_uppercase(),
            _ => return Err(CommandError::InvalidCommandArgument),
        };

        let mut arguments: Vec<String> = Vec::with_capacity(elements.len() - 1);

        for element in elements.into_iter().skip(1) {
            match element {
                RespValue::BulkString(s) => arguments.push(s),
                _ => return Err(CommandError::InvalidCommand),
            }
        }

        Ok(Self { name, arguments })
    }

    /// Checks the command's arguments without executing it, so a bad
    /// command is rejected at queue time rather than poisoning an EXEC.
    pub fn validate_command_arguments(&self) -> Option<CommandError> {
        match self.name.as_str() {
            "PING" => PingArguments::parse(self.arguments.clone()).err(),
            "ECHO" => EchoArguments::parse(self.arguments.clone()).err(),
            "GET" => GetArguments::parse(self.arguments.clone()).err(),
            "SET" => SetArguments::parse(self.arguments.clone()).err(),
            "DEL" => DelArguments::parse(self.arguments.clone()).err(),
            "INCR" => IncrArguments::parse(self.arguments.clone()).err(),
            "TYPE" => TypeArguments::parse(self.arguments.clone()).err(),
            "RPUSH" => PushArguments::parse(self.arguments.clone(), false).err(),
            "LPUSH" => PushArguments::parse(self.arguments.clone(), true).err(),
            "LRANGE" => LrangeArguments::parse(self.arguments.clone()).err(),
            "LLEN" => LlenArguments::parse(self.arguments.clone()).err(),
            "LPOP" => LpopArguments::parse(self.arguments.clone()).err(),
            "BLPOP" => BlpopArguments::parse(self.arguments.clone()).err(),
            "XADD" => XaddArguments::parse(self.arguments.clone()).err(),
            "XRANGE" => XrangeArguments::parse(self.arguments.clone()).err(),
            "XREAD" => XreadArguments::parse(self.arguments.clone()).err(),
            "MULTI" => MultiArguments::parse(self.arguments.clone()).err(),
            "EXEC" => ExecArguments::parse(self.arguments.clone()).err(),
            "DISCARD" => DiscardArguments::parse(self.arguments.clone()).err(),
            "INFO" => InfoArguments::parse(self.arguments.clone()).err(),
            "COMMAND" => CommandDocsArguments::parse(self.arguments.clone()).err(),
            _ => Some(CommandError::UnknownCommand(self.name.clone())),
        }
    }

    /// Executes the command against the store and shared state.
    /// Suspending commands (BLPOP, XREAD) may park here until data
    /// arrives or their deadline elapses.
    pub async fn handle_command(
        &self,
        config: Arc<ServerConfig>,
        client_address: &str,
        store: Arc<Mutex<KeyValueStore>>,
        state: Arc<Mutex<State>>,
    ) -> Result<CommandResult, CommandError> {
        match self.name.as_str() {
            "PING" => ping(self.arguments.clone()),
            "ECHO" => echo(self.arguments.clone()),
            "GET" => get(store, self.arguments.clone()).await,
            "SET" => set(store, self.arguments.clone()).await,
            "DEL" => del(store, self.arguments.clone()).await,
            "INCR" => incr(store, self.arguments.clone()).await,
            "TYPE" => type_command(store, self.arguments.clone()).await,
            "RPUSH" => rpush(store, state, self.arguments.clone()).await,
            "LPUSH" => lpush(store, state, self.arguments.clone()).await,
            "LRANGE" => lrange(store, self.arguments.clone()).await,
            "LLEN" => llen(store, self.arguments.clone()).await,
            "LPOP" => lpop(store, self.arguments.clone()).await,
            "BLPOP" => blpop(client_address, store, state, self.arguments.clone()).await,
            "XADD" => xadd(store, state, self.arguments.clone()).await,
            "XRANGE" => xrange(store, self.arguments.clone()).await,
            "XREAD" => xread(client_address, store, state, self.arguments.clone()).await,
            "MULTI" => multi(client_address, state, self.arguments.clone()).await,
            "EXEC" => exec(client_address, state, self.arguments.clone()).await,
            "DISCARD" => discard(client_address, state, self.arguments.clone()).await,
            "INFO" => info(config, self.arguments.clone()),
            "COMMAND" => command_docs(self.arguments.clone()),
            _ => Err(CommandError::UnknownCommand(self.name.clone())),
        }
    }

    /// Executes the command while replaying a transaction. Suspending
    /// commands must not suspend here: they return whatever immediate
    /// result is available instead of registering a waiter.
    pub async fn handle_transaction_command(
        &self,
        client_address: &str,
        config: Arc<ServerConfig>,
        store: Arc<Mutex<KeyValueStore>>,
        state: Arc<Mutex<State>>,
    ) -> Result<CommandResult, CommandError> {
        match self.name.as_str() {
            "BLPOP" => blpop_immediate(store, self.arguments.clone()).await,
            "XREAD" => xread_immediate(store, self.arguments.clone()).await,
            _ => {
                self.handle_command(config, client_address, store, state)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CommandHandler;
    use crate::{commands::command_error::CommandError, resp::RespValue};

    fn command_frame(parts: &[&str]) -> RespValue {
        RespValue::Array(
            parts
                .iter()
                .map(|s| RespValue::BulkString(s.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_new_uppercases_name_and_keeps_arguments() {
        let handler = CommandHandler::new(command_frame(&["rpush", "fruits", "pear"])).unwrap();

        assert_eq!(handler.name, "RPUSH");
        assert_eq!(
            handler.arguments,
            vec!["fruits".to_string(), "pear".to_string()]
        );
    }

    #[test]
    fn test_new_rejects_non_command_frames() {
        assert_eq!(
            CommandHandler::new(RespValue::SimpleString("PING".to_string())),
            Err(CommandError::InvalidCommand)
        );
        assert_eq!(
            CommandHandler::new(RespValue::Array(vec![RespValue::Integer(1)])),
            Err(CommandError::InvalidCommandArgument)
        );
        assert_eq!(
            CommandHandler::new(RespValue::Array(vec![
                RespValue::BulkString("GET".to_string()),
                RespValue::Integer(1),
            ])),
            Err(CommandError::InvalidCommand)
        );
    }

    #[test]
    fn test_validate_command_arguments() {
        let valid = CommandHandler::new(command_frame(&["GET", "key"])).unwrap();
        assert_eq!(valid.validate_command_arguments(), None);

        let wrong_arity = CommandHandler::new(command_frame(&["GET"])).unwrap();
        assert_eq!(
            wrong_arity.validate_command_arguments(),
            Some(CommandError::WrongArity("get"))
        );

        let unknown = CommandHandler::new(command_frame(&["FLY"])).unwrap();
        assert_eq!(
            unknown.validate_command_arguments(),
            Some(CommandError::UnknownCommand("FLY".to_string()))
        );
    }
}
