//! Configuration for the agent

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming a TOML config file
pub const CONFIG_PATH_ENV: &str = "CLUSTER_AGENT_CONFIG";

/// Prefix for per-field environment overrides (`CLUSTER_AGENT__JOIN_ADDRS=...`)
pub const ENV_PREFIX: &str = "CLUSTER_AGENT";

/// Agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Bind address for the agent HTTP API
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Candidate manager addresses, probed in order
    #[serde(default)]
    pub join_addrs: Vec<String>,

    /// Fixed delay between reconnect attempts
    #[serde(default = "default_rejoin_backoff")]
    pub rejoin_backoff_ms: u64,

    /// Upper bound for a single liveness probe
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    /// Gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9998))
}
fn default_rejoin_backoff() -> u64 {
    3_000
}
fn default_probe_timeout() -> u64 {
    5_000
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address the local gateway is reachable on; announced to the resolver
    #[serde(default)]
    pub advertise_ip: Option<IpAddr>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            join_addrs: Vec::new(),
            rejoin_backoff_ms: default_rejoin_backoff(),
            probe_timeout_ms: default_probe_timeout(),
            gateway: GatewayConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl AgentConfig {
    /// Load config from an optional TOML file, then `CLUSTER_AGENT__*` env vars.
    ///
    /// When `path` is `None` the file named by `CLUSTER_AGENT_CONFIG` is used if set.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok();
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        } else if let Some(env_path) = env_path.as_deref() {
            builder = builder.add_source(config::File::from(Path::new(env_path)).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("join_addrs")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Reject configurations the agent cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.join_addrs.is_empty() {
            return Err(Error::InvalidConfig(
                "join_addrs must name at least one manager".into(),
            ));
        }
        if self.join_addrs.iter().any(|addr| addr.trim().is_empty()) {
            return Err(Error::InvalidConfig("join_addrs contains an empty address".into()));
        }
        if self.rejoin_backoff_ms == 0 {
            return Err(Error::InvalidConfig("rejoin_backoff_ms must be > 0".into()));
        }
        if self.probe_timeout_ms == 0 {
            return Err(Error::InvalidConfig("probe_timeout_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn rejoin_backoff(&self) -> Duration {
        Duration::from_millis(self.rejoin_backoff_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
