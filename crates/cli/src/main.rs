use clap::{Parser, Subcommand};
use doh_relay_domain::CliOverrides;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

mod bootstrap;
mod ctl;
mod di;
mod service;

use service::ProxyService;

#[derive(Parser)]
#[command(name = "doh-relay")]
#[command(version)]
#[command(about = "Local DNS proxy forwarding to DNS-over-HTTPS with endpoint failover")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Plaintext DNS listen address
    #[arg(short = 'l', long, global = true)]
    listen: Option<String>,

    /// Control socket path (named pipe name on Windows)
    #[arg(long, global = true)]
    control_socket: Option<String>,

    /// Settings file path
    #[arg(long, global = true)]
    settings: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the relay service (default)
    Run,

    /// Send one control event to a running service
    Ctl {
        /// Event name: open, enable, disable, status, settings
        name: String,

        /// Event payload as a JSON object
        #[arg(long)]
        data: Option<String>,

        /// Keep printing broadcast events until interrupted
        #[arg(long)]
        watch: bool,

        /// Seconds to wait for a reply
        #[arg(long, default_value_t = 5)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        listen: cli.listen.clone(),
        control_path: cli.control_socket.clone(),
        settings_path: cli.settings.clone(),
        log_level: cli.log_level.clone(),
    };

    match cli.command {
        Some(Command::Ctl {
            name,
            data,
            watch,
            timeout,
        }) => {
            bootstrap::init_client_logging(cli.log_level.as_deref());
            let config = bootstrap::load_config(cli.config.as_deref(), overrides)?;
            ctl::run(
                &config.control.path,
                &name,
                data.as_deref(),
                watch,
                Duration::from_secs(timeout),
            )
            .await
        }
        Some(Command::Run) | None => run_service(cli.config.as_deref(), overrides).await,
    }
}

async fn run_service(config_path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<()> {
    let config = bootstrap::load_config(config_path, overrides)?;
    bootstrap::init_logging(&config);

    info!("Starting doh-relay v{}", env!("CARGO_PKG_VERSION"));

    // reqwest carries its own provider; this covers any other rustls user.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let mut service = ProxyService::new(&config)?;
    if let Err(e) = service.start().await {
        error!(error = %e, "Cannot start relay service");
        service.stop().await;
        return Err(e);
    }

    wait_for_shutdown().await?;
    service.stop().await;

    info!("Shutdown complete");
    Ok(())
}

async fn wait_for_shutdown() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    }

    #[cfg(windows)]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
