use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use daylog::config::{self, LoggerOptions};
use daylog::{Logger, LoggerLayer};

#[tokio::main]
async fn main() -> Result<()> {
    let options = LoggerOptions::load(Path::new(config::CONFIG_FILE))?;

    let logger = Logger::new(options);
    logger.install_fatal_handler();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(LoggerLayer::new(logger.clone()))
        .init();

    tracing::debug!(
        path = %logger.options().path.display(),
        system = logger.options().system.name(),
        "forwarding stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        logger.info(line);
    }

    logger.save().context("failed to save pending log lines")?;
    Ok(())
}
