use std::{
    sync::Arc,
    time::{Duration, UNIX_EPOCH},
};

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::{ExpiryPolicy, KeyValueStore},
    resp::RespValue,
};

/// Conditional guard for SET: only set when the key is absent (NX) or
/// only when it already exists (XX).
#[derive(Debug, PartialEq, Clone, Copy)]
enum SetCondition {
    IfAbsent,
    IfPresent,
}

/// Represents the parsed arguments for the SET command.
///
/// Beyond the key and value, SET accepts an expiry option (`EX seconds`,
/// `PX milliseconds`, `EXAT unix-seconds`, `PXAT unix-milliseconds`) and
/// a conditional guard (`NX` / `XX`).
pub struct SetArguments {
    key: String,
    value: String,
    expiry: ExpiryPolicy,
    condition: Option<SetCondition>,
}

impl SetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::WrongArity("set"));
        }

        let mut expiry = ExpiryPolicy::NoExpiry;
        let mut condition = None;
        let mut index = 2;

        while index < arguments.len() {
            match arguments[index].to_uppercase().as_str() {
                option @ ("EX" | "PX" | "EXAT" | "PXAT") => {
                    let Some(raw_value) = arguments.get(index + 1) else {
                        return Err(CommandError::InvalidSetCommandExpiration);
                    };

                    let value = raw_value
                        .parse::<u64>()
                        .map_err(|_| CommandError::InvalidSetCommandExpiration)?;

                    expiry = match option {
                        "EX" => ExpiryPolicy::RelativeTtl(Duration::from_secs(value)),
                        "PX" => ExpiryPolicy::RelativeTtl(Duration::from_millis(value)),
                        "EXAT" => ExpiryPolicy::AbsoluteDeadline(
                            UNIX_EPOCH + Duration::from_secs(value),
                        ),
                        _ => ExpiryPolicy::AbsoluteDeadline(
                            UNIX_EPOCH + Duration::from_millis(value),
                        ),
                    };

                    index += 2;
                }
                "NX" => {
                    condition = Some(SetCondition::IfAbsent);
                    index += 1;
                }
                "XX" => {
                    condition = Some(SetCondition::IfPresent);
                    index += 1;
                }
                _ => return Err(CommandError::InvalidSetCommandArgument),
            }
        }

        Ok(Self {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            expiry,
            condition,
        })
    }
}

/// Handles the SET command. Replies `OK` on success, or a null bulk
/// string when an NX/XX guard prevented the write.
pub async fn set(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;

    let key_exists = store_guard.contains_key(&set_arguments.key);
    let guard_failed = match set_arguments.condition {
        Some(SetCondition::IfAbsent) => key_exists,
        Some(SetCondition::IfPresent) => !key_exists,
        None => false,
    };

    if guard_failed {
        return Ok(CommandResult::Response(RespValue::NullBulkString.encode()));
    }

    store_guard.set(set_arguments.key, set_arguments.value, set_arguments.expiry);

    Ok(CommandResult::Response(
        RespValue::SimpleString("OK".to_string()).encode(),
    ))
}
