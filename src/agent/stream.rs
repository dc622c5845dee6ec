//! Manager event stream client
//!
//! The manager publishes task events as `text/event-stream`. Only two markers are read:
//!
//! ```text
//! event: TaskHealthy
//! data: {"AppID":"web","TaskID":"web-0-3f2a",...}
//!
//! ```
//!
//! A recognized `event:` line must be followed directly by its `data:` line,
//! otherwise the record is dropped. `id:`, `retry:` and comments are ignored.

use crate::common::{endpoint_url, Error, Result};
use crate::events::{EventKind, RawStreamFrame};
use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::StreamExt;
use tokio::sync::mpsc;

/// Capacity of the queue between the stream reader and the router
pub const DISPATCH_QUEUE_CAPACITY: usize = 1024;

const EVENT_PREFIX: &str = "event:";
const DATA_PREFIX: &str = "data:";

pub type DispatchSender = mpsc::Sender<RawStreamFrame>;
pub type DispatchReceiver = mpsc::Receiver<RawStreamFrame>;

/// Bounded FIFO hand-off. A full queue makes the reader wait; nothing is dropped.
pub fn dispatch_channel() -> (DispatchSender, DispatchReceiver) {
    mpsc::channel(DISPATCH_QUEUE_CAPACITY)
}

/// Turns stream lines into frames
#[derive(Debug, Default)]
pub struct SseFramer {
    pending: Option<EventKind>,
}

impl SseFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one physical line (terminator optional). Returns a frame when a
    /// recognized event line is immediately followed by a data line.
    pub fn push_line(&mut self, line: &str) -> Option<RawStreamFrame> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);

        if let Some(kind) = self.pending.take() {
            if let Some(data) = line.strip_prefix(DATA_PREFIX) {
                return Some(RawStreamFrame::new(kind, data.as_bytes()));
            }
            tracing::debug!("{} record without data line, dropped", kind);
        }

        if line.is_empty() {
            return None;
        }

        if let Some(label) = line.strip_prefix(EVENT_PREFIX) {
            let label = label.trim();
            match EventKind::from_label(label) {
                Some(kind) => self.pending = Some(kind),
                None => tracing::trace!("ignoring event type {}", label),
            }
        }

        None
    }
}

/// Accumulates body chunks and yields complete `\n`-terminated lines
#[derive(Debug, Default)]
struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    fn next_line(&mut self) -> Option<String> {
        let end = self.buf.iter().position(|b| *b == b'\n')?;
        let line = self.buf.split_to(end + 1);
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

/// Something that feeds frames from a leader into the dispatch queue
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Stream from `leader` until the connection fails. Stream closure is an error.
    async fn stream(&self, leader: &str, queue: &DispatchSender) -> Result<()>;
}

/// Reads `GET {leader}/events?catchUp=true`
pub struct EventStreamClient {
    client: reqwest::Client,
}

impl EventStreamClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventSource for EventStreamClient {
    async fn stream(&self, leader: &str, queue: &DispatchSender) -> Result<()> {
        let url = endpoint_url(leader, "/events?catchUp=true");
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(Error::UnexpectedStatus {
                status: resp.status().as_u16(),
                url,
            });
        }

        let mut body = resp.bytes_stream();
        let mut lines = LineBuffer::default();
        let mut framer = SseFramer::new();

        while let Some(chunk) = body.next().await {
            lines.extend(&chunk?);
            while let Some(line) = lines.next_line() {
                if let Some(frame) = framer.push_line(&line) {
                    queue.send(frame).await.map_err(|_| Error::DispatchClosed)?;
                }
            }
        }

        Err(Error::StreamClosed(leader.to_string()))
    }
}
