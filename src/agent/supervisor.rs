//! Supervisor loop: locate the leader, follow its events, back off, repeat

use crate::agent::locator::{LeaderLocator, Probe};
use crate::agent::stream::{DispatchSender, EventSource};
use crate::common::Error;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Where the supervisor is in its cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Locating,
    Streaming { leader: String },
    Backoff,
    Stopped,
}

impl SupervisorState {
    pub fn label(&self) -> &'static str {
        match self {
            SupervisorState::Idle => "idle",
            SupervisorState::Locating => "locating",
            SupervisorState::Streaming { .. } => "streaming",
            SupervisorState::Backoff => "backoff",
            SupervisorState::Stopped => "stopped",
        }
    }

    pub fn leader(&self) -> Option<&str> {
        match self {
            SupervisorState::Streaming { leader } => Some(leader),
            _ => None,
        }
    }
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub struct Supervisor<P, S> {
    locator: LeaderLocator<P>,
    source: S,
    backoff: Duration,
    state: watch::Sender<SupervisorState>,
}

impl<P: Probe, S: EventSource> Supervisor<P, S> {
    pub fn new(locator: LeaderLocator<P>, source: S, backoff: Duration) -> Self {
        let (state, _) = watch::channel(SupervisorState::Idle);
        Self {
            locator,
            source,
            backoff,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SupervisorState {
        self.state.borrow().clone()
    }

    fn transition(&self, next: SupervisorState) {
        tracing::debug!("supervisor -> {:?}", next);
        self.state.send_replace(next);
    }

    /// Run until `cancel` fires or the dispatch queue's consumer goes away.
    ///
    /// Discovery and stream failures are retried after a fixed backoff, forever.
    pub async fn run(&self, queue: DispatchSender, cancel: CancellationToken) {
        loop {
            self.transition(SupervisorState::Locating);
            let located = tokio::select! {
                _ = cancel.cancelled() => break,
                located = self.locator.locate() => located,
            };

            match located {
                Err(e) => {
                    tracing::error!("detect manager leader got error: {}, retry ...", e);
                }
                Ok(leader) => {
                    tracing::info!("detected manager addr {}, listening on events ...", leader);
                    self.transition(SupervisorState::Streaming {
                        leader: leader.clone(),
                    });

                    let streamed = tokio::select! {
                        _ = cancel.cancelled() => break,
                        streamed = self.source.stream(&leader, &queue) => streamed,
                    };

                    match streamed {
                        Err(Error::DispatchClosed) => {
                            tracing::warn!("dispatch queue closed, supervisor exiting");
                            break;
                        }
                        Err(e) => {
                            tracing::error!("watch manager events got error: {}, retry ...", e);
                        }
                        Ok(()) => {
                            tracing::warn!("event stream from {} ended, retry ...", leader);
                        }
                    }
                }
            }

            self.transition(SupervisorState::Backoff);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.backoff) => {}
            }
        }

        self.transition(SupervisorState::Stopped);
    }
}
