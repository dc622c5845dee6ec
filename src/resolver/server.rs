//! Resolver service

use crate::common::{Error, Result};
use crate::resolver::record::{Record, RecordTable, ResolverRecordChange};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Receiving side of resolver record changes
pub trait ResolverSink: Send + Sync {
    /// Hand a change to the resolver. Never blocks and reports nothing back.
    fn emit_change(&self, change: ResolverRecordChange);
}

/// In-memory resolver. Changes are queued by `emit_change` and applied by `serve`.
pub struct Resolver {
    tx: mpsc::UnboundedSender<ResolverRecordChange>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<ResolverRecordChange>>>,
    table: Arc<Mutex<RecordTable>>,
}

impl Resolver {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            table: Arc::new(Mutex::new(RecordTable::new())),
        }
    }

    /// Apply queued changes until cancelled
    pub async fn serve(&self, cancel: CancellationToken) -> Result<()> {
        let mut rx = self
            .rx
            .lock()
            .map_err(|_| Error::Internal("resolver lock poisoned".into()))?
            .take()
            .ok_or_else(|| Error::startup("resolver", "already started"))?;

        tracing::info!("✓ Resolver ready");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                change = rx.recv() => match change {
                    Some(change) => self.apply(change),
                    None => break,
                },
            }
        }

        tracing::info!("Resolver stopped");
        Ok(())
    }

    fn apply(&self, change: ResolverRecordChange) {
        tracing::debug!(
            change = ?change.change,
            record_type = %change.record_type,
            app = %change.app_name,
            slot = %change.slot_id,
            ip = %change.ip,
            "Applying resolver change"
        );
        if let Ok(mut table) = self.table.lock() {
            table.apply(change);
        }
    }

    /// Snapshot of served task records
    pub fn records(&self) -> Vec<Record> {
        self.table.lock().map(|t| t.records()).unwrap_or_default()
    }

    /// Snapshot of announced gateway addresses
    pub fn proxies(&self) -> Vec<String> {
        self.table.lock().map(|t| t.proxies()).unwrap_or_default()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverSink for Resolver {
    fn emit_change(&self, change: ResolverRecordChange) {
        if self.tx.send(change).is_err() {
            tracing::warn!("resolver stopped, change dropped");
        }
    }
}
