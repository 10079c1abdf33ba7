use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
};

pub struct CommandDocsArguments;

impl CommandDocsArguments {
    // COMMAND takes arbitrary subcommands (clients send COMMAND DOCS on
    // connect); they are all answered by the same stub.
    pub fn parse(_arguments: Vec<String>) -> Result<Self, CommandError> {
        Ok(Self)
    }
}

/// Handles the COMMAND command with a fixed placeholder payload.
pub fn command_docs(arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    CommandDocsArguments::parse(arguments)?;

    Ok(CommandResult::Response(
        RespValue::BulkString("DOCS placeholder".to_string()).encode(),
    ))
}
