//! Common utilities and types shared across cluster-agent

pub mod config;
pub mod error;
pub mod utils;

pub use config::{AgentConfig, GatewayConfig};
pub use error::{Error, Result};
pub use utils::{endpoint_url, parse_duration};
