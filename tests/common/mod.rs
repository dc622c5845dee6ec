//! Fake manager used by the integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};

pub fn get_free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// What `/events` answers with
#[derive(Clone)]
pub enum Feed {
    /// Send the body then close the connection
    Close(String),
    /// Send the body then keep the connection open
    Hold(String),
    Status(StatusCode),
}

#[derive(Clone)]
struct ManagerState {
    feed: Feed,
    queries: Arc<Mutex<Vec<Option<String>>>>,
}

pub struct FakeManager {
    pub addr: SocketAddr,
    queries: Arc<Mutex<Vec<Option<String>>>>,
}

impl FakeManager {
    pub async fn start(feed: Feed) -> Self {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let state = ManagerState {
            feed,
            queries: queries.clone(),
        };
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .route("/events", get(events))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, queries }
    }

    /// `host:port`, the form managers are configured with
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn event_queries(&self) -> Vec<Option<String>> {
        self.queries.lock().unwrap().clone()
    }
}

async fn events(State(state): State<ManagerState>, RawQuery(query): RawQuery) -> Response {
    state.queries.lock().unwrap().push(query);

    let body = match state.feed {
        Feed::Status(status) => return status.into_response(),
        Feed::Close(body) => Body::from(body),
        Feed::Hold(body) => Body::from_stream(async_stream::stream! {
            yield Ok::<_, std::convert::Infallible>(body);
            std::future::pending::<()>().await;
        }),
    };

    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

pub fn task_json(task_id: &str, slot: u32, mode: &str, gateway: bool) -> String {
    format!(
        r#"{{"AppID":"web","TaskID":"{}","InstanceName":"web","SlotIndex":{},"ClusterID":"c1","RunAs":"ops","IP":"10.1.1.{}","Port":8080,"Weight":100,"VersionID":"v1","Mode":"{}","GatewayEnabled":{}}}"#,
        task_id,
        slot,
        slot + 10,
        mode,
        gateway
    )
}
