use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, Mutex},
    time::{timeout_at, Instant},
};

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
    state::{ListWaiter, State},
};

/// Represents the parsed arguments for the BLPOP command.
///
/// `BLPOP key [key ...] timeout`: the timeout is the last argument, in
/// (possibly fractional) seconds, with 0 meaning wait forever.
pub struct BlpopArguments {
    keys: Vec<String>,
    timeout_seconds: f64,
}

impl BlpopArguments {
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::WrongArity("blpop"));
        }

        let raw_timeout = arguments.pop().unwrap_or_default();
        let timeout_seconds = raw_timeout
            .parse::<f64>()
            .map_err(|_| CommandError::InvalidBLPopTimeout)?;

        if !timeout_seconds.is_finite() || timeout_seconds < 0.0 {
            return Err(CommandError::InvalidBLPopTimeout);
        }

        Ok(Self {
            keys: arguments,
            timeout_seconds,
        })
    }
}

/// Handles the BLPOP command.
///
/// Pops immediately when any of the keys has data (scanning in argument
/// order). Otherwise registers as a FIFO waiter on every key and
/// suspends until a push arrives or the deadline elapses. A wakeup whose
/// push was consumed by someone else re-queues and keeps waiting; the
/// deadline replies with a null array.
pub async fn blpop(
    client_address: &str,
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;

    if let Some(response) = pop_first_available(&store, &blpop_arguments.keys).await? {
        return Ok(CommandResult::Response(response));
    }

    let deadline = match blpop_arguments.timeout_seconds {
        timeout if timeout == 0.0 => None,
        timeout => Some(Instant::now() + Duration::from_secs_f64(timeout)),
    };

    let (sender, mut receiver) = mpsc::channel(1);
    register_waiters(&state, &blpop_arguments.keys, client_address, &sender).await;

    let result = loop {
        let notified = match deadline {
            None => receiver.recv().await,
            Some(deadline) => match timeout_at(deadline, receiver.recv()).await {
                Ok(notified) => notified,
                Err(_) => break Ok(RespValue::NullArray.encode()),
            },
        };

        // We keep a sender alive, so a closed channel only happens on
        // teardown; answer as a timeout either way.
        if notified.is_none() {
            break Ok(RespValue::NullArray.encode());
        }

        match pop_first_available(&store, &blpop_arguments.keys).await {
            Ok(Some(response)) => break Ok(response),
            Ok(None) => {
                // The push was consumed before we got to it. The wakeup
                // already used up one registration, so queue up afresh
                // on every key and keep waiting.
                remove_waiters(&state, &blpop_arguments.keys, client_address).await;
                register_waiters(&state, &blpop_arguments.keys, client_address, &sender).await;
            }
            Err(err) => break Err(err),
        }
    };

    remove_waiters(&state, &blpop_arguments.keys, client_address).await;

    result.map(CommandResult::Response)
}

/// Non-blocking variant for BLPOP replayed inside a transaction: an
/// immediate pop if data is available, a null array otherwise.
pub async fn blpop_immediate(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;

    match pop_first_available(&store, &blpop_arguments.keys).await? {
        Some(response) => Ok(CommandResult::Response(response)),
        None => Ok(CommandResult::Response(RespValue::NullArray.encode())),
    }
}

async fn pop_first_available(
    store: &Arc<Mutex<KeyValueStore>>,
    keys: &[String],
) -> Result<Option<String>, CommandError> {
    let mut store_guard = store.lock().await;

    for key in keys {
        if let Some(mut values) = store_guard.pop_front(key, 1)? {
            if let Some(value) = values.pop() {
                return Ok(Some(RespValue::encode_array_from_strings(vec![
                    key.clone(),
                    value,
                ])));
            }
        }
    }

    Ok(None)
}

async fn register_waiters(
    state: &Arc<Mutex<State>>,
    keys: &[String],
    client_address: &str,
    sender: &mpsc::Sender<bool>,
) {
    let mut state_guard = state.lock().await;

    for key in keys {
        state_guard.add_list_waiter(
            key.clone(),
            ListWaiter {
                client_address: client_address.to_string(),
                sender: sender.clone(),
            },
        );
    }
}

async fn remove_waiters(state: &Arc<Mutex<State>>, keys: &[String], client_address: &str) {
    let mut state_guard = state.lock().await;

    for key in keys {
        state_guard.remove_list_waiter(key, client_address);
    }
}

#[cfg(test)]
mod tests {
    use super::BlpopArguments;

    #[test]
    fn test_parse() {
        let parsed =
            BlpopArguments::parse(vec!["fruits".to_string(), "0.5".to_string()]).unwrap();
        assert_eq!(parsed.keys, vec!["fruits".to_string()]);
        assert_eq!(parsed.timeout_seconds, 0.5);

        let parsed = BlpopArguments::parse(vec![
            "a".to_string(),
            "b".to_string(),
            "0".to_string(),
        ])
        .unwrap();
        assert_eq!(parsed.keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(parsed.timeout_seconds, 0.0);

        assert!(BlpopArguments::parse(vec!["fruits".to_string()]).is_err());
        assert!(
            BlpopArguments::parse(vec!["fruits".to_string(), "soon".to_string()]).is_err()
        );
        assert!(
            BlpopArguments::parse(vec!["fruits".to_string(), "-1".to_string()]).is_err()
        );
    }
}
