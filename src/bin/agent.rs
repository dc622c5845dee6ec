//! Agent binary

use anyhow::Context;
use clap::Parser;
use cluster_agent::{common::parse_duration, Agent, AgentConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "cluster-agent")]
#[command(about = "Cluster node agent: follows the manager leader and feeds the local resolver and gateway")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to $CLUSTER_AGENT_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Candidate manager addresses (comma-separated, probed in order)
    #[arg(short, long, value_delimiter = ',')]
    join: Vec<String>,

    /// Bind address for the agent HTTP API
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Delay between reconnect attempts (e.g. 3s, 500ms)
    #[arg(long, value_parser = parse_backoff)]
    backoff: Option<Duration>,

    /// Address the local gateway is reachable on
    #[arg(long)]
    advertise_ip: Option<IpAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_backoff(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load config from file and env, then override with CLI arguments
    let mut config =
        AgentConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    if !args.join.is_empty() {
        config.join_addrs = args.join;
    }
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(backoff) = args.backoff {
        config.rejoin_backoff_ms =
            u64::try_from(backoff.as_millis()).context("--backoff is too large")?;
    }
    if let Some(ip) = args.advertise_ip {
        config.gateway.advertise_ip = Some(ip);
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let agent = Agent::new(config)?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl-C, shutting down");
                shutdown.cancel();
            }
        });
    }

    agent.run(shutdown).await?;

    Ok(())
}
