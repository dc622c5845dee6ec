//! Manager leader discovery

use crate::common::{endpoint_url, Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Liveness check against a single manager address
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, addr: &str) -> Result<()>;
}

#[async_trait]
impl<T: Probe + ?Sized> Probe for std::sync::Arc<T> {
    async fn probe(&self, addr: &str) -> Result<()> {
        (**self).probe(addr).await
    }
}

/// `GET {addr}/ping`, alive on any 2xx
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, addr: &str) -> Result<()> {
        let url = endpoint_url(addr, "/ping");
        let resp = self.client.get(&url).timeout(self.timeout).send().await?;
        if !resp.status().is_success() {
            return Err(Error::UnexpectedStatus {
                status: resp.status().as_u16(),
                url,
            });
        }
        Ok(())
    }
}

/// Finds the first reachable manager among the configured candidates
pub struct LeaderLocator<P> {
    candidates: Vec<String>,
    probe: P,
}

impl<P: Probe> LeaderLocator<P> {
    pub fn new(candidates: Vec<String>, probe: P) -> Self {
        Self { candidates, probe }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Probe candidates in order and return the first that answers.
    ///
    /// Nothing is cached: every call starts again from the head of the list.
    pub async fn locate(&self) -> Result<String> {
        for addr in &self.candidates {
            match self.probe.probe(addr).await {
                Ok(()) => return Ok(addr.clone()),
                Err(e) => {
                    tracing::info!("probe manager {} got error: {}", addr, e);
                }
            }
        }

        Err(Error::NoLeaderAvailable)
    }
}
