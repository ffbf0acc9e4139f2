use anyhow::Result;
use clap::Parser;
use reclip_common::observability::{init_logging, LogConfig};
use reclip_config::ReclipConfigLoader;
use tokio_util::sync::CancellationToken;

mod assemble;

/// Mention-driven video re-hosting bot.
#[derive(Debug, Parser)]
#[command(name = "reclip", version)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "reclip.yaml")]
    config: std::path::PathBuf,
    /// Mirror log events to stderr in addition to the log file.
    #[arg(long)]
    stderr: bool,
    /// Override the log directory.
    #[arg(long)]
    log_dir: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Missing credentials surface here and abort the start.
    let cfg = ReclipConfigLoader::new().with_file(&args.config).load()?;

    let log_path = init_logging(LogConfig {
        emit_stderr: args.stderr,
        log_dir: args.log_dir.clone(),
        ..LogConfig::default()
    })?;
    tracing::info!(
        config = %args.config.display(),
        log = %log_path.display(),
        "starting reclip"
    );

    let poller = assemble::build(&cfg).await?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received shutdown signal");
            signal_cancel.cancel();
        }
    });

    poller.run(cancel).await;
    Ok(())
}
