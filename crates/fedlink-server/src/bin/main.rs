//! fedlink-server binary: federated link resolver
//!
//! Run with:
//! ```bash
//! cargo run -p fedlink-server -- --config fedlink.json
//! ```

use std::path::PathBuf;

use clap::Parser;
use fedlink_core::{Config, DEFAULT_CONFIG_FILE};
use fedlink_server::{metrics, ServerBuilder};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fedlink-server")]
#[command(about = "Redirect storage object links to the federation member holding them")]
struct Args {
    /// Config file (JSON)
    #[arg(long, short, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Listen port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Per-probe timeout in milliseconds (overrides config)
    #[arg(long)]
    probe_timeout_ms: Option<u64>,

    /// Serve Prometheus metrics at /metrics
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fedlink_server=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(timeout) = args.probe_timeout_ms {
        config.probe_timeout_ms = timeout;
    }

    let mut builder = ServerBuilder::new(config);
    if args.metrics {
        let handle = metrics::init_prometheus_recorder()?;
        builder = builder.prometheus(handle);
    }

    let server = builder.build()?;
    tracing::info!("Server ready on {}", server.addr());
    server.run().await?;

    Ok(())
}
