//! Control-plane event bridge
//!
//! The agent is responsible for:
//! - Locating the active manager among the configured candidates
//! - Following the leader's task event stream, reconnecting on failure
//! - Translating task events for the local resolver and gateway
//! - Serving a small status API

pub mod http;
pub mod locator;
pub mod router;
pub mod server;
pub mod stream;
pub mod supervisor;

pub use locator::{HttpProbe, LeaderLocator, Probe};
pub use router::{backend_change, resolver_change, EventRouter};
pub use server::Agent;
pub use stream::{
    dispatch_channel, DispatchReceiver, DispatchSender, EventSource, EventStreamClient, SseFramer,
    DISPATCH_QUEUE_CAPACITY,
};
pub use supervisor::{Supervisor, SupervisorState};
