use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, Mutex},
    time::{timeout_at, Instant},
};

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        stream_utils::stream_collection_to_resp,
    },
    key_value_store::{KeyValueStore, StoreError, StreamFields, StreamId},
    resp::RespValue,
    state::{State, StreamWaiter},
};

/// Represents the parsed arguments for the XREAD command.
///
/// Format: `XREAD [BLOCK milliseconds] STREAMS key1 key2 ... id1 id2 ...`
/// The keys and ids are two equal-length halves of the argument tail.
#[derive(Debug)]
pub struct XreadArguments {
    /// Optional blocking duration in milliseconds. `None` for a
    /// non-blocking read; 0 means block until data arrives.
    blocking_duration: Option<u64>,
    /// `(key, raw id)` pairs; each id is an exclusive lower bound, with
    /// `$` standing for "only entries added after this call".
    key_stream_pairs: Vec<(String, String)>,
}

impl XreadArguments {
    /// Parses XREAD arguments in both forms.
    ///
    /// # Errors
    ///
    /// * `WrongArity` - fewer than three arguments
    /// * `InvalidXReadBlockDuration` - BLOCK not followed by an integer
    /// * `InvalidXReadOption` - something other than BLOCK/STREAMS where
    ///   an option was expected
    /// * `UnbalancedXRead` - the keys and ids halves differ in length
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 3 {
            return Err(CommandError::WrongArity("xread"));
        }

        let (blocking_duration, start_data_index) = match arguments[0].to_lowercase().as_str() {
            "block" => {
                let duration_ms = arguments[1]
                    .parse::<u64>()
                    .map_err(|_| CommandError::InvalidXReadBlockDuration)?;

                if arguments.get(2).map(|s| s.to_lowercase()) != Some("streams".to_string()) {
                    return Err(CommandError::InvalidXReadOption);
                }

                (Some(duration_ms), 3)
            }
            "streams" => (None, 1),
            _ => return Err(CommandError::InvalidXReadOption),
        };

        let data = &arguments[start_data_index..];

        if data.is_empty() || data.len() % 2 != 0 {
            return Err(CommandError::UnbalancedXRead);
        }

        let split_index = data.len() / 2;
        let mut key_stream_pairs = Vec::with_capacity(split_index);

        for i in 0..split_index {
            key_stream_pairs.push((data[i].clone(), data[split_index + i].clone()));
        }

        Ok(Self {
            blocking_duration,
            key_stream_pairs,
        })
    }
}

/// Handles the XREAD command.
///
/// Reads entries newer than the given ids from one or more streams. In
/// blocking mode an empty result suspends the client: it registers as a
/// broadcast waiter on every requested key and re-evaluates the whole
/// wait-set on each wakeup, so an append to any one key resolves the
/// read. The reply groups entries per key in the order the keys were
/// given; keys with nothing new are omitted, and a read that produces
/// nothing at all replies with the null array.
pub async fn xread(
    client_address: &str,
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;

    // `$` placeholders become the concrete latest id now, at
    // registration time, so entries appended from here on count as new.
    let resolved_ids = resolve_start_ids(&store, &xread_arguments.key_stream_pairs).await?;

    let Some(block_ms) = xread_arguments.blocking_duration else {
        let streams = read_streams(&store, &resolved_ids).await?;
        return Ok(CommandResult::Response(encode_streams_reply(&streams)));
    };

    let streams = read_streams(&store, &resolved_ids).await?;

    if !streams.is_empty() {
        return Ok(CommandResult::Response(
            stream_collection_to_resp(&streams).encode(),
        ));
    }

    let deadline = match block_ms {
        0 => None,
        ms => Some(Instant::now() + Duration::from_millis(ms)),
    };

    let (sender, mut receiver) = mpsc::channel(32);
    register_waiters(&state, &resolved_ids, client_address, &sender).await;

    let result = loop {
        let notified = match deadline {
            None => receiver.recv().await,
            Some(deadline) => match timeout_at(deadline, receiver.recv()).await {
                Ok(notified) => notified,
                Err(_) => break Ok(RespValue::NullArray.encode()),
            },
        };

        if notified.is_none() {
            break Ok(RespValue::NullArray.encode());
        }

        match read_streams(&store, &resolved_ids).await {
            Ok(streams) if !streams.is_empty() => {
                break Ok(stream_collection_to_resp(&streams).encode());
            }
            // Spurious wakeup; our registrations are still in place.
            Ok(_) => continue,
            Err(err) => break Err(err),
        }
    };

    remove_waiters(&state, &resolved_ids, client_address).await;

    result.map(CommandResult::Response)
}

/// Non-blocking variant for XREAD replayed inside a transaction: any
/// BLOCK option is ignored and an empty read replies with the null
/// array immediately.
pub async fn xread_immediate(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;
    let resolved_ids = resolve_start_ids(&store, &xread_arguments.key_stream_pairs).await?;
    let streams = read_streams(&store, &resolved_ids).await?;

    Ok(CommandResult::Response(encode_streams_reply(&streams)))
}

fn encode_streams_reply(streams: &[(String, Vec<(StreamId, StreamFields)>)]) -> String {
    if streams.is_empty() {
        RespValue::NullArray.encode()
    } else {
        stream_collection_to_resp(streams).encode()
    }
}

/// Resolves each raw id to a concrete exclusive lower bound: `$` is the
/// stream's current last id (or the minimum for an absent stream), a
/// bare timestamp gets sequence 0.
async fn resolve_start_ids(
    store: &Arc<Mutex<KeyValueStore>>,
    key_stream_pairs: &[(String, String)],
) -> Result<Vec<(String, StreamId)>, CommandError> {
    let mut store_guard = store.lock().await;
    let mut resolved = Vec::with_capacity(key_stream_pairs.len());

    for (key, raw_id) in key_stream_pairs {
        let id = if raw_id == "$" {
            store_guard.last_stream_id(key)?.unwrap_or(StreamId::MIN)
        } else if raw_id.contains('-') {
            raw_id.parse::<StreamId>()?
        } else {
            let ms = raw_id
                .parse::<u64>()
                .map_err(|_| CommandError::Store(StoreError::InvalidStreamId))?;
            StreamId::new(ms, 0)
        };

        resolved.push((key.clone(), id));
    }

    Ok(resolved)
}

/// Reads every stream's entries strictly after its resolved id,
/// omitting keys with nothing new and preserving the input key order.
async fn read_streams(
    store: &Arc<Mutex<KeyValueStore>>,
    resolved_ids: &[(String, StreamId)],
) -> Result<Vec<(String, Vec<(StreamId, StreamFields)>)>, CommandError> {
    let mut store_guard = store.lock().await;
    let mut streams = Vec::new();

    for (key, after) in resolved_ids {
        let entries = store_guard.entries_after(key, *after)?;

        if !entries.is_empty() {
            streams.push((key.clone(), entries));
        }
    }

    Ok(streams)
}

async fn register_waiters(
    state: &Arc<Mutex<State>>,
    resolved_ids: &[(String, StreamId)],
    client_address: &str,
    sender: &mpsc::Sender<bool>,
) {
    let mut state_guard = state.lock().await;

    for (key, _) in resolved_ids {
        state_guard.add_stream_waiter(
            key.clone(),
            StreamWaiter {
                client_address: client_address.to_string(),
                sender: sender.clone(),
            },
        );
    }
}

async fn remove_waiters(
    state: &Arc<Mutex<State>>,
    resolved_ids: &[(String, StreamId)],
    client_address: &str,
) {
    let mut state_guard = state.lock().await;

    for (key, _) in resolved_ids {
        state_guard.remove_stream_waiter(key, client_address);
    }
}
