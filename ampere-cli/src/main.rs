use std::io::Write;
use std::sync::Arc;

use ampere_cli::app::Stores;
use ampere_cli::cli::Cli;
use ampere_cli::config::AppConfig;
use ampere_cli::{commands, logging};
use ampere_core::SystemClock;
use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config =
        AppConfig::load(cli.config.as_deref())?.with_overrides(cli.backend, cli.db);
    logging::init(&config.logging)?;
    debug!(?config, "configuration loaded");

    let mut stores = Stores::connect(&config, Arc::new(SystemClock)).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(cli.command, &mut stores, &mut out).await?;
    out.flush()?;

    Ok(())
}
