//! Gateway service

use crate::common::{Error, Result};
use crate::gateway::upstream::{BackendChange, Upstream, UpstreamRegistry};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Receiving side of backend changes
pub trait GatewaySink: Send + Sync {
    /// Hand a backend change to the gateway. Never blocks and reports nothing back.
    fn emit_event(&self, event: BackendChange);
}

/// In-memory backend registry fed through `emit_event`
pub struct Gateway {
    tx: mpsc::UnboundedSender<BackendChange>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<BackendChange>>>,
    registry: Arc<Mutex<UpstreamRegistry>>,
}

impl Gateway {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            registry: Arc::new(Mutex::new(UpstreamRegistry::new())),
        }
    }

    /// Apply queued backend changes until cancelled
    pub async fn serve(&self, cancel: CancellationToken) -> Result<()> {
        let mut rx = self
            .rx
            .lock()
            .map_err(|_| Error::Internal("gateway lock poisoned".into()))?
            .take()
            .ok_or_else(|| Error::startup("gateway", "already started"))?;

        tracing::info!("✓ Gateway ready");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = rx.recv() => match event {
                    Some(event) => {
                        tracing::debug!(
                            action = ?event.action,
                            upstream = %event.upstream,
                            backend = %event.backend,
                            "Applying backend change"
                        );
                        if let Ok(mut registry) = self.registry.lock() {
                            registry.apply(event);
                        }
                    }
                    None => break,
                },
            }
        }

        tracing::info!("Gateway stopped");
        Ok(())
    }

    pub fn upstreams(&self) -> Vec<Upstream> {
        self.registry
            .lock()
            .map(|r| r.upstreams())
            .unwrap_or_default()
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewaySink for Gateway {
    fn emit_event(&self, event: BackendChange) {
        if self.tx.send(event).is_err() {
            tracing::warn!("gateway stopped, backend change dropped");
        }
    }
}
