//! Event router: decodes queued frames and fans them out to the resolver and gateway

use crate::agent::stream::DispatchReceiver;
use crate::common::Result;
use crate::events::{EventKind, Mode, RawStreamFrame, TaskLifecycleEvent};
use crate::gateway::{BackendAction, BackendChange, GatewaySink};
use crate::resolver::{Change, RecordType, ResolverRecordChange, ResolverSink};
use std::net::IpAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Resolver view of a task event. `None` for kinds the resolver does not track.
pub fn resolver_change(kind: EventKind, event: &TaskLifecycleEvent) -> Option<ResolverRecordChange> {
    if !kind.affects_resolver() {
        return None;
    }

    let change = if kind == EventKind::TaskHealthy {
        Change::Add
    } else {
        Change::Del
    };

    let (record_type, port) = match event.mode {
        Mode::Replicated => (RecordType::A | RecordType::SRV, Some(event.port.to_string())),
        Mode::Single => (RecordType::A, None),
    };

    Some(ResolverRecordChange {
        change,
        record_type,
        ip: event.ip.clone(),
        port,
        cluster: event.cluster_id.clone(),
        run_as: event.run_as.clone(),
        app_name: event.app_id.clone(),
        instance_name: event.instance_name.clone(),
        slot_id: event.slot_index.to_string(),
        weight: event.weight,
        is_proxy: false,
    })
}

/// Gateway view of a task event
pub fn backend_change(kind: EventKind, event: &TaskLifecycleEvent) -> BackendChange {
    let action = match kind {
        EventKind::TaskHealthy => BackendAction::Add,
        EventKind::TaskUnhealthy => BackendAction::Del,
        EventKind::TaskWeightChange => BackendAction::Change,
    };

    BackendChange {
        action,
        upstream: event.app_id.clone(),
        alias: String::new(),
        listen: String::new(),
        backend: event.task_id.clone(),
        ip: event.ip.clone(),
        port: event.port,
        weight: event.weight,
        version: event.version_id.clone(),
    }
}

/// Single consumer of the dispatch queue
pub struct EventRouter {
    resolver: Arc<dyn ResolverSink>,
    gateway: Arc<dyn GatewaySink>,
    advertise_ip: Option<IpAddr>,
}

impl EventRouter {
    pub fn new(resolver: Arc<dyn ResolverSink>, gateway: Arc<dyn GatewaySink>) -> Self {
        Self {
            resolver,
            gateway,
            advertise_ip: None,
        }
    }

    /// Announce the local gateway address to the resolver when the router starts
    pub fn with_advertise_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.advertise_ip = ip;
        self
    }

    /// Decode one frame and deliver the derived changes
    pub fn route(&self, frame: &RawStreamFrame) -> Result<()> {
        let event = frame.decode()?;

        if event.gateway_enabled {
            self.gateway.emit_event(backend_change(frame.kind, &event));
        }

        if let Some(change) = resolver_change(frame.kind, &event) {
            self.resolver.emit_change(change);
        }

        Ok(())
    }

    /// Drain the queue in arrival order until it closes or `cancel` fires
    pub async fn run(&self, mut queue: DispatchReceiver, cancel: CancellationToken) {
        if let Some(ip) = self.advertise_ip {
            tracing::info!("announcing gateway address {} to resolver", ip);
            self.resolver
                .emit_change(ResolverRecordChange::proxy(Change::Add, ip.to_string()));
        }

        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => break,
                frame = queue.recv() => match frame {
                    Some(frame) => frame,
                    None => break,
                },
            };

            if let Err(e) = self.route(&frame) {
                tracing::error!("decode {} event got error: {}, dropped", frame.kind, e);
            }
        }

        tracing::info!("Event router stopped");
    }
}
