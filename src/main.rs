use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info};

use assed::app::{self, RunSummary};
use assed::config::Config;

mod cli;

use cli::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Parse CLI arguments first so --help works without logs
    let args = Args::parse();

    // RUST_LOG wins over the -q/-v flags
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_level()));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("Starting ASSED");

    match start(&args).await {
        Ok(summary) => {
            info!("Finished... Items processed: {}", summary.downloaded);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn start(args: &Args) -> Result<RunSummary> {
    let config = Config::from_env()?;
    debug!(?config, "Configuration loaded");

    app::run(&config, args.url.as_deref(), args.show.as_deref()).await
}
