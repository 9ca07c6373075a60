use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::watch;

use relayroom::domain::traits::Transport;
use relayroom::infrastructure::adapters::WebSocketTransport;
use relayroom::{Chatroom, Config};

#[derive(Parser)]
#[command(name = "relayroom")]
#[command(about = "In-memory websocket chatroom", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the chat server
    Run {
        /// Listen host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Show version
    Version,
    /// Print the default config
    InitConfig,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { host, port } => run_server(&cli.config, host, port),
        Commands::Version => {
            println!("relayroom v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    }
}

fn run_server(config_path: &str, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    // Missing or invalid config is fatal: no defaults behind the operator's back
    let mut config = Config::load(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let room = Arc::new(Chatroom::new(&config)?);
    tracing::info!("Starting relayroom v{}: {}", env!("CARGO_PKG_VERSION"), room);

    let transport = WebSocketTransport::new(&config.server);
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for interrupt: {}", e);
                // Keep the sender alive so the server keeps running
                std::future::pending::<()>().await;
            }
            tracing::warn!("Interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        });

        tracing::info!("Serving over {}", transport.name());
        transport.serve(room, shutdown_rx).await
    })?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_config() -> anyhow::Result<()> {
    let yaml = Config::default().to_yaml()?;
    println!("{}", yaml);
    println!("\n# Save this to config.yaml and adjust as needed.");
    Ok(())
}
