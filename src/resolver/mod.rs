//! Local service resolver
//!
//! Keeps the cluster-internal name records derived from task health:
//! - A records for single-instance apps
//! - combined A+SRV records for replicated apps
//! - the gateway's advertise address

pub mod record;
pub mod server;

pub use record::{Change, Record, RecordKey, RecordTable, RecordType, ResolverRecordChange};
pub use server::{Resolver, ResolverSink};
