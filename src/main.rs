use anyhow::Result;
use clap::Parser;
use tracing::error;

use appdata_explorer_lib::cli::{self, Cli};
use appdata_explorer_lib::infrastructure::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = cli.config_manager()?.load_config().await?;
    cli.apply_overrides(&mut config);

    logging::init_logging_with_config(config.logging.clone())?;
    logging::log_system_info(&config.logging);

    cli::run(cli, config).await
}
