//! greeterd: the hello service daemon.
//!
//! Single binary that assembles the service:
//! - Counter store (Redis, or in-memory)
//! - Host metrics probe
//! - Peer discovery (load balancer, or a single local peer in debug mode)
//! - Cluster health aggregator
//! - REST API
//!
//! # Usage
//!
//! ```text
//! greeterd serve --config /etc/greeter/greeter.toml --port 8080
//! ```

mod bootstrap;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use greeter_api::{ApiState, build_router};
use greeter_cluster::{ClusterAggregator, ClusterReporter, PeerDiscovery};
use greeter_core::GreeterConfig;
use greeter_health::{HostProbe, MetadataClient};
use greeter_store::CounterStore;

const DEFAULT_LOG_FILTER: &str = "info,greeterd=debug,greeter=debug";

#[derive(Parser)]
#[command(name = "greeterd", about = "Hello service daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the hello API.
    Serve {
        /// TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides configuration).
        #[arg(long)]
        port: Option<u16>,

        /// Log output format.
        #[arg(long, value_enum, default_value = "text")]
        log_format: LogFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            log_format,
        } => {
            init_tracing(log_format);
            run_serve(config, port).await
        }
    }
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    info!("greeter daemon starting");

    let mut config = GreeterConfig::load(config_path.as_deref())?;
    if let Some(port) = port {
        config.server.port = port;
    }
    info!(
        path = ?config_path,
        debug = config.cluster.debug,
        port = config.server.port,
        "configuration loaded"
    );

    // ── Initialize subsystems ──────────────────────────────────

    let metadata = MetadataClient::from_config(&config);
    let region = bootstrap::resolve_region(&config, &metadata).await;

    // Counter store.
    let store = CounterStore::from_config(&config.store).await?;
    info!(key = %store.key(), in_memory = store.is_in_memory(), "counter store ready");

    // Host probe.
    let probe = HostProbe::from_config(&config);
    info!("host probe initialized");

    // Discovery + aggregation.
    let discovery = PeerDiscovery::from_config(&config, &region).await;
    let aggregator = ClusterAggregator::from_config(&config);
    info!(
        timeout = ?aggregator.timeout(),
        policy = ?aggregator.policy(),
        "cluster aggregator initialized"
    );
    let cluster = ClusterReporter::new(discovery, aggregator);

    // ── Start API server ───────────────────────────────────────

    let router = build_router(ApiState {
        store,
        probe,
        cluster,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("greeter daemon stopped");
    Ok(())
}
