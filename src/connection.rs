//! The per-connection loop: read bytes, decode frames, dispatch
//! commands, write replies.
//!
//! Each connection owns a growable read buffer. A read may deliver any
//! slice of the byte stream, so the loop drains complete frames one by
//! one and leaves a trailing partial frame in the buffer for the next
//! read to extend. Command errors are replied to on the same connection,
//! which stays open; a zero-length read tears the connection down and
//! purges everything it registered in the shared state.

use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::Mutex,
};
use tracing::{debug, error, info};

use crate::{
    commands::{run_transaction_commands, CommandDispatcher, CommandHandler, DispatchResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
    server::ServerConfig,
    state::State,
};

pub async fn handle_client_connection(
    stream: TcpStream,
    client_address: String,
    config: Arc<ServerConfig>,
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
) {
    let (mut reader, mut writer) = stream.into_split();
    let mut buffer = BytesMut::with_capacity(4096);
    let dispatcher = CommandDispatcher::new(&client_address, Arc::clone(&state));

    'connection: loop {
        match reader.read_buf(&mut buffer).await {
            Ok(0) => break,
            Ok(_) => (),
            Err(err) => {
                error!("error reading from {}: {}", client_address, err);
                break;
            }
        }

        loop {
            match RespValue::decode(&buffer) {
                Ok(Some((frame, consumed))) => {
                    buffer.advance(consumed);

                    let response = process_frame(
                        frame,
                        &dispatcher,
                        Arc::clone(&config),
                        Arc::clone(&store),
                        Arc::clone(&state),
                    )
                    .await;

                    if let Err(err) = write_to_stream(&mut writer, response.as_bytes()).await {
                        error!("error writing to {}: {}", client_address, err);
                        break 'connection;
                    }
                }
                // A partial frame; keep the bytes and read more.
                Ok(None) => break,
                Err(err) => {
                    // The frame failed, and with it any chance of
                    // finding the next frame boundary in this stream.
                    debug!("malformed frame from {}: {}", client_address, err);

                    if let Err(err) = write_to_stream(&mut writer, err.as_string().as_bytes()).await
                    {
                        error!("error writing to {}: {}", client_address, err);
                    }

                    break 'connection;
                }
            }
        }
    }

    info!("client disconnected: {}", client_address);

    // The connection may have been blocked on any number of keys and
    // may hold an open transaction; all of it goes.
    let mut state_guard = state.lock().await;
    state_guard.clear_connection(&client_address);
}

async fn process_frame(
    frame: RespValue,
    dispatcher: &CommandDispatcher,
    config: Arc<ServerConfig>,
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
) -> String {
    let command = match CommandHandler::new(frame) {
        Ok(command) => command,
        Err(err) => return err.as_string(),
    };

    match dispatcher
        .dispatch_command(command, Arc::clone(&config), Arc::clone(&store))
        .await
    {
        Ok(DispatchResult::ImmediateResponse(response)) => response,
        Ok(DispatchResult::ExecuteTransactionCommands(commands)) => {
            run_transaction_commands(&dispatcher.client_address, config, store, state, commands)
                .await
        }
        Err(err) => err.as_string(),
    }
}

async fn write_to_stream<W>(writer: &mut W, response: &[u8]) -> tokio::io::Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    writer.write_all(response).await?;
    writer.flush().await?;

    Ok(())
}
