use std::sync::Arc;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    server::ServerConfig,
};

pub struct InfoArguments {
    section: Option<String>,
}

impl InfoArguments {
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() > 1 {
            return Err(CommandError::WrongArity("info"));
        }

        Ok(Self {
            section: arguments.pop(),
        })
    }
}

/// Handles the INFO command: the full configuration as a flat key-value
/// block, one named section of it, or an empty bulk string for a
/// section that does not exist.
pub fn info(
    config: Arc<ServerConfig>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let info_arguments = InfoArguments::parse(arguments)?;
    let sections = config.config_sections();

    let response = match info_arguments.section {
        None => RespValue::encode_config_block(
            sections
                .iter()
                .flat_map(|(_, entries)| entries.iter())
                .map(|(key, value)| (*key, value.clone())),
        ),
        Some(requested) => {
            let requested = requested.to_lowercase();

            match sections.iter().find(|(name, _)| *name == requested) {
                Some((_, entries)) => RespValue::encode_config_block(
                    entries.iter().map(|(key, value)| (*key, value.clone())),
                ),
                None => RespValue::BulkString(String::new()).encode(),
            }
        }
    };

    Ok(CommandResult::Response(response))
}
