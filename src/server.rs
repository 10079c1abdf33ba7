//! Server configuration and the TCP accept loop.

use std::sync::Arc;

use thiserror::Error;
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    sync::Mutex,
};
use tracing::{error, info, warn};

use crate::{
    connection::handle_client_connection, key_value_store::KeyValueStore, resp::RespValue,
    state::State,
};

#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("Invalid command line flag")]
    InvalidCommandLineFlag,
    #[error("Invalid command line flag value")]
    InvalidCommandLineFlagValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `Some((host, port))` when this server runs as a replica of
    /// another instance. The only replication behavior implemented is a
    /// single announce PING on startup.
    pub replica_of: Option<(String, u16)>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 6379,
            replica_of: None,
        }
    }
}

impl ServerConfig {
    /// Parses the process arguments: `--port <n>`, `--bind <host>` and
    /// `--replicaof "<host> <port>"`.
    pub fn from_args<I: IntoIterator<Item = String>>(
        command_line_args: I,
    ) -> Result<Self, CliError> {
        let mut iter = command_line_args.into_iter().skip(1);
        let mut config = ServerConfig::default();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--port" => {
                    let Some(port_str) = iter.next() else {
                        return Err(CliError::InvalidCommandLineFlagValue);
                    };

                    let port = port_str
                        .parse::<u16>()
                        .map_err(|_| CliError::InvalidCommandLineFlagValue)?;

                    if port == 0 {
                        return Err(CliError::InvalidCommandLineFlagValue);
                    }

                    config.port = port;
                }
                "--bind" => {
                    let Some(host) = iter.next() else {
                        return Err(CliError::InvalidCommandLineFlagValue);
                    };

                    config.host = host;
                }
                "--replicaof" => {
                    let Some(master) = iter.next() else {
                        return Err(CliError::InvalidCommandLineFlagValue);
                    };

                    let parts = master.split_whitespace().collect::<Vec<&str>>();

                    if parts.len() != 2 {
                        return Err(CliError::InvalidCommandLineFlagValue);
                    }

                    let master_port = parts[1]
                        .parse::<u16>()
                        .map_err(|_| CliError::InvalidCommandLineFlagValue)?;

                    config.replica_of = Some((parts[0].to_string(), master_port));
                }
                _ => return Err(CliError::InvalidCommandLineFlag),
            }
        }

        Ok(config)
    }

    pub fn role(&self) -> &'static str {
        if self.replica_of.is_some() {
            "slave"
        } else {
            "master"
        }
    }

    /// The configuration INFO exposes, grouped by section.
    pub fn config_sections(&self) -> Vec<(&'static str, Vec<(&'static str, String)>)> {
        let mut replication = vec![("role", self.role().to_string())];

        if let Some((master_host, master_port)) = &self.replica_of {
            replication.push(("master_host", master_host.clone()));
            replication.push(("master_port", master_port.to_string()));
        }

        vec![
            (
                "server",
                vec![
                    ("bind", self.host.clone()),
                    ("tcp_port", self.port.to_string()),
                ],
            ),
            ("replication", replication),
        ]
    }
}

/// Binds the listener and serves connections until the process exits.
/// Each accepted connection runs on its own task against the shared
/// store and state.
pub async fn run(config: Arc<ServerConfig>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    info!("listening on {}:{}", config.host, config.port);

    if let Some((master_host, master_port)) = config.replica_of.clone() {
        tokio::spawn(async move {
            ping_master(&master_host, master_port).await;
        });
    }

    let store = Arc::new(Mutex::new(KeyValueStore::new()));
    let state = Arc::new(Mutex::new(State::new()));

    loop {
        match listener.accept().await {
            Ok((stream, address)) => {
                info!("accepted new connection from {}", address);

                let config = Arc::clone(&config);
                let store = Arc::clone(&store);
                let state = Arc::clone(&state);

                tokio::spawn(async move {
                    handle_client_connection(stream, address.to_string(), config, store, state)
                        .await;
                });
            }
            Err(err) => error!("error accepting connection: {}", err),
        }
    }
}

/// A replica announces itself to its master with a single PING.
async fn ping_master(master_host: &str, master_port: u16) {
    match TcpStream::connect((master_host, master_port)).await {
        Ok(mut stream) => {
            let ping = RespValue::encode_array_from_strings(vec!["PING".to_string()]);

            match stream.write_all(ping.as_bytes()).await {
                Ok(()) => info!("pinged master at {}:{}", master_host, master_port),
                Err(err) => warn!(
                    "could not ping master at {}:{}: {}",
                    master_host, master_port, err
                ),
            }
        }
        Err(err) => warn!(
            "could not connect to master at {}:{}: {}",
            master_host, master_port, err
        ),
    }
}
