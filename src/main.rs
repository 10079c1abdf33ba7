use std::{env, sync::Arc};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use tidepool::server::{self, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_args(env::args()).context("invalid command line arguments")?;

    server::run(Arc::new(config)).await
}
