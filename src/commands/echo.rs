use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
};

pub struct EchoArguments {
    message: String,
}

impl EchoArguments {
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongArity("echo"));
        }

        Ok(Self {
            message: arguments.remove(0),
        })
    }
}

pub fn echo(arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let echo_arguments = EchoArguments::parse(arguments)?;

    Ok(CommandResult::Response(
        RespValue::BulkString(echo_arguments.message).encode(),
    ))
}
