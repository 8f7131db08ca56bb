use anyhow::Result;
use clap::Parser;
use crawlshot::{read_config_file, setup_logging, Cli, CliRunner, Config};
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    setup_logging(args.verbose)?;

    info!("Starting crawlshot v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args).await?;
    let cli_runner = CliRunner::new(config);

    // Setup graceful shutdown
    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    let _shutdown_handler = setup_shutdown_handler(shutdown_tx);

    if let Err(e) = cli_runner.run(args.command, shutdown_rx).await {
        error!("Application error: {:#}", e);
        std::process::exit(1);
    }

    info!("Crawlshot stopped");
    Ok(())
}

async fn load_config(args: &Cli) -> Result<Config> {
    let mut config = match &args.config {
        Some(config_path) => read_config_file(config_path).await?,
        None => Config::default(),
    };

    // Override with CLI arguments
    if let Some(timeout) = args.timeout {
        config.navigation_timeout = Duration::from_secs(timeout);
    }

    if let Some(chrome_path) = &args.chrome_path {
        config.chrome_path = Some(chrome_path.clone());
    }

    info!("Configuration loaded");
    info!("Seed URL: {}", config.seed_url);
    info!("Navigation timeout: {:?}", config.navigation_timeout);

    Ok(config)
}

fn setup_shutdown_handler(shutdown_tx: tokio::sync::broadcast::Sender<()>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    warn!("Failed to create SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for SIGINT: {}", e);
                    return;
                }
                info!("Received SIGINT");
            }
            _ = terminate => {
                info!("Received SIGTERM");
            }
        }

        let _ = shutdown_tx.send(());
    })
}
