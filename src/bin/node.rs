//! minilead node binary

use clap::{Parser, Subcommand};
use minilead::{ClusterConfig, LogSink, Node, SystemProbe};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "minilead")]
#[command(about = "Self-organizing leader election over broadcast UDP")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a node (role is decided by the election, not by flags)
    Serve {
        /// Config file (TOML); CLI flags override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address other peers should use to reach this node
        #[arg(long)]
        advertise_ip: Option<String>,

        /// Local address to bind sockets on
        #[arg(long)]
        bind_ip: Option<String>,

        /// Destination for UDP broadcasts
        #[arg(long)]
        broadcast: Option<String>,

        /// Discovery port (leader announcements)
        #[arg(long)]
        discovery_port: Option<u16>,

        /// Gossip port (ranked candidates)
        #[arg(long)]
        gossip_port: Option<u16>,

        /// Service port (TCP telemetry)
        #[arg(long)]
        service_port: Option<u16>,

        /// Assume leadership immediately (first node of a cold cluster)
        #[arg(long)]
        bootstrap_leader: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            advertise_ip,
            bind_ip,
            broadcast,
            discovery_port,
            gossip_port,
            service_port,
            bootstrap_leader,
        } => {
            // Load config from file, then override with CLI arguments
            let mut cluster_config = ClusterConfig::load(config.as_deref())?;
            if advertise_ip.is_some() {
                cluster_config.advertise_ip = advertise_ip;
            }
            if let Some(bind_ip) = bind_ip {
                cluster_config.bind_ip = bind_ip;
            }
            if let Some(broadcast) = broadcast {
                cluster_config.broadcast_addr = broadcast;
            }
            if let Some(port) = discovery_port {
                cluster_config.discovery_port = port;
            }
            if let Some(port) = gossip_port {
                cluster_config.gossip_port = port;
            }
            if let Some(port) = service_port {
                cluster_config.service_port = port;
            }
            if bootstrap_leader {
                cluster_config.bootstrap_leader = true;
            }
            cluster_config.validate()?;

            let node = Arc::new(Node::new(
                cluster_config,
                Arc::new(SystemProbe::new()),
                Arc::new(LogSink),
            ));
            tracing::info!("starting minilead {} as {}", minilead::VERSION, node.address());

            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("shutdown requested");
                    let _ = shutdown_tx.send(true);
                }
            });

            node.run(shutdown_rx).await?;
            tracing::info!("node stopped");
        }
    }

    Ok(())
}
