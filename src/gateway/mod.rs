//! Local gateway backend registry
//!
//! Tracks which task backends serve each upstream so the reverse proxy
//! can balance traffic across them.

pub mod server;
pub mod upstream;

pub use server::{Gateway, GatewaySink};
pub use upstream::{Backend, BackendAction, BackendChange, Upstream, UpstreamRegistry};
