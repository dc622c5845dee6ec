//! # cluster-agent
//!
//! Node agent bridging a cluster manager's event feed to local services:
//! - Leader discovery by probing candidate managers in order
//! - Long-lived event stream with fixed-backoff reconnect
//! - Bounded, ordered hand-off between stream reader and router
//! - Task events translated for the local resolver and gateway
//!
//! ## Architecture
//!
//! ```text
//!  ┌────────────┐  ┌────────────┐  ┌────────────┐
//!  │ manager 1  │  │ manager 2  │  │ manager 3  │
//!  └─────┬──────┘  └─────┬──────┘  └────────────┘
//!        │ /ping         │ /events?catchUp=true
//!  ┌─────▼───────────────▼──────┐
//!  │ Supervisor                 │
//!  │  LeaderLocator → Stream    │
//!  └─────────────┬──────────────┘
//!                │ dispatch queue (1024)
//!  ┌─────────────▼──────────────┐
//!  │ EventRouter                │
//!  └──────┬──────────────┬──────┘
//!         │              │
//!  ┌──────▼─────┐  ┌─────▼──────┐
//!  │ Resolver   │  │ Gateway    │
//!  └────────────┘  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! cluster-agent \
//!   --join 10.0.0.1:9999,10.0.0.2:9999,10.0.0.3:9999 \
//!   --listen 0.0.0.0:9998 \
//!   --advertise-ip 10.0.0.21
//! ```

pub mod agent;
pub mod common;
pub mod events;
pub mod gateway;
pub mod resolver;

// Re-export commonly used types
pub use agent::Agent;
pub use common::{AgentConfig, Error, Result};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
