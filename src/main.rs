use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::UdpSocket;
use tracing::info;
use tracing_subscriber::EnvFilter;

use horizon::config::load_config;
use horizon::inflight::InflightTable;
use horizon::mux::Multiplexer;
use horizon::resolver::{Resolver, StubResolver};

#[derive(Parser)]
#[command(name = "horizon")]
#[command(about = "DNS resolver and forwarding proxy", long_about = None)]
struct Args {
    /// Path to the JSON config file
    #[arg(short, long, default_value = "horizon.json")]
    config: PathBuf,

    /// Override the downstream bind address (host:port)
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the upstream resolver IPv4 address
    #[arg(short, long)]
    upstream: Option<String>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let default_directive = if debug { "horizon=debug" } else { "horizon=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let mut config = load_config(&args.config)?;
    if let Some(bind) = args.bind {
        config.transport.downstream_bind = bind;
    }
    if let Some(upstream) = args.upstream {
        config.resolver.stub.primary_upstream_ipv4 = upstream;
    }

    let bind_addr = config.downstream_bind_addr()?;
    let upstream_addr = config.upstream_addr()?;

    let downstream = Arc::new(
        UdpSocket::bind(bind_addr)
            .await
            .with_context(|| format!("bind downstream socket on {bind_addr}"))?,
    );
    let upstream = Arc::new(
        UdpSocket::bind("0.0.0.0:0")
            .await
            .context("bind upstream socket")?,
    );

    let table = InflightTable::new(
        Duration::from_secs(config.resolver.query_timeout_secs),
        config.resolver.max_inflight,
    );
    let resolver = Resolver::new(StubResolver::new(upstream.clone(), upstream_addr));
    let mux = Multiplexer::new(downstream, upstream, table, resolver);

    info!(bind = %bind_addr, upstream = %upstream_addr, "horizon listening");

    mux.run().await.context("multiplexer event loop")?;
    Ok(())
}
