//! Agent: starts every subsystem and joins them, first error wins

use crate::agent::http::{self, ApiState};
use crate::agent::locator::{HttpProbe, LeaderLocator};
use crate::agent::router::EventRouter;
use crate::agent::stream::{dispatch_channel, EventStreamClient};
use crate::agent::supervisor::Supervisor;
use crate::common::{AgentConfig, Error, Result};
use crate::gateway::Gateway;
use crate::resolver::Resolver;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub struct Agent {
    config: AgentConfig,
    resolver: Arc<Resolver>,
    gateway: Arc<Gateway>,
    client: reqwest::Client,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.probe_timeout())
            .build()?;

        Ok(Self {
            config,
            resolver: Arc::new(Resolver::new()),
            gateway: Arc::new(Gateway::new()),
            client,
        })
    }

    pub fn resolver(&self) -> Arc<Resolver> {
        self.resolver.clone()
    }

    pub fn gateway(&self) -> Arc<Gateway> {
        self.gateway.clone()
    }

    /// Run every subsystem until `shutdown` fires or one of them fails.
    ///
    /// Only a subsystem error ends the agent early; discovery, stream and decode
    /// failures are absorbed by the supervisor and router.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        tracing::info!("Starting cluster agent {}", crate::VERSION);
        tracing::info!("  HTTP API: {}", self.config.listen_addr);
        tracing::info!("  Managers: {}", self.config.join_addrs.join(", "));
        tracing::info!("  Rejoin backoff: {:?}", self.config.rejoin_backoff());

        let cancel = shutdown.child_token();

        let locator = LeaderLocator::new(
            self.config.join_addrs.clone(),
            HttpProbe::new(self.client.clone(), self.config.probe_timeout()),
        );
        let supervisor = Arc::new(Supervisor::new(
            locator,
            EventStreamClient::new(self.client.clone()),
            self.config.rejoin_backoff(),
        ));
        let router = EventRouter::new(self.resolver.clone(), self.gateway.clone())
            .with_advertise_ip(self.config.gateway.advertise_ip);
        let (queue_tx, queue_rx) = dispatch_channel();

        let api_state = ApiState {
            supervisor: supervisor.subscribe(),
            resolver: self.resolver.clone(),
            gateway: self.gateway.clone(),
            started_at: chrono::Utc::now(),
        };

        let mut tasks: JoinSet<(&'static str, Result<()>)> = JoinSet::new();

        {
            let resolver = self.resolver.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move { ("resolver", resolver.serve(cancel).await) });
        }
        {
            let gateway = self.gateway.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move { ("gateway", gateway.serve(cancel).await) });
        }
        {
            let addr = self.config.listen_addr;
            let cancel = cancel.clone();
            tasks.spawn(async move { ("http api", http::serve(addr, api_state, cancel).await) });
        }
        {
            let cancel = cancel.clone();
            tasks.spawn(async move {
                router.run(queue_rx, cancel).await;
                ("event router", Ok(()))
            });
        }
        {
            let cancel = cancel.clone();
            tasks.spawn(async move {
                supervisor.run(queue_tx, cancel).await;
                ("supervisor", Ok(()))
            });
        }

        let mut first_error: Option<Error> = None;
        while let Some(joined) = tasks.join_next().await {
            let (name, result) = match joined {
                Ok(done) => done,
                Err(e) => ("subsystem", Err(Error::Internal(format!("task failed: {}", e)))),
            };

            match result {
                Ok(()) if cancel.is_cancelled() => tracing::info!("{} stopped", name),
                Ok(()) => tracing::warn!("{} quit", name),
                Err(e) => {
                    tracing::error!("{} quit, error: {}", name, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                        cancel.cancel();
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
