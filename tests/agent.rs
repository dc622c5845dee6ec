//! Whole agent against a fake manager

mod common;

use cluster_agent::{Agent, AgentConfig, Error};
use common::{get_free_port, task_json, FakeManager, Feed};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn config(join_addrs: Vec<String>, listen_port: u16) -> AgentConfig {
    AgentConfig {
        listen_addr: SocketAddr::from(([127, 0, 0, 1], listen_port)),
        join_addrs,
        rejoin_backoff_ms: 100,
        probe_timeout_ms: 1_000,
        ..Default::default()
    }
}

async fn get_json(url: &str) -> Option<Value> {
    let text = reqwest::get(url).await.ok()?.text().await.ok()?;
    serde_json::from_str(&text).ok()
}

#[tokio::test]
async fn test_agent_follows_leader_events() {
    let body = format!(
        "event: TaskHealthy\ndata: {}\n\nevent: TaskHealthy\ndata: {}\n\n",
        task_json("web-0", 0, "replicated", true),
        task_json("web-1", 1, "replicated", true),
    );
    let manager = FakeManager::start(Feed::Hold(body)).await;
    let dead = format!("127.0.0.1:{}", get_free_port());
    let port = get_free_port();

    let mut config = config(vec![dead, manager.address()], port);
    config.gateway.advertise_ip = Some("10.0.0.21".parse().unwrap());
    let agent = Agent::new(config).unwrap();
    let resolver = agent.resolver();
    let gateway = agent.gateway();

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(agent.run(shutdown.clone()));

    let status_url = format!("http://127.0.0.1:{}/v1/status", port);
    let mut status = Value::Null;
    for _ in 0..200 {
        if resolver.records().len() == 2 && !gateway.upstreams().is_empty() {
            if let Some(current) = get_json(&status_url).await {
                status = current;
                if status["leader"].is_string() {
                    break;
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status["leader"].as_str(), Some(manager.address().as_str()));
    assert_eq!(status["state"], "streaming");
    assert_eq!(status["version"], cluster_agent::VERSION);
    assert_eq!(resolver.proxies(), vec!["10.0.0.21"]);

    let records = get_json(&format!("http://127.0.0.1:{}/v1/resolver/records", port))
        .await
        .unwrap();
    assert_eq!(records["records"].as_array().unwrap().len(), 2);
    let upstreams = get_json(&format!("http://127.0.0.1:{}/v1/gateway/upstreams", port))
        .await
        .unwrap();
    assert_eq!(upstreams["upstreams"][0]["backends"].as_array().unwrap().len(), 2);

    let pong = reqwest::get(format!("http://127.0.0.1:{}/ping", port))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(pong, "pong");

    shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_agent_reconnects_after_stream_closes() {
    let body = format!(
        "event: TaskHealthy\ndata: {}\n\n",
        task_json("web-0", 0, "single", false)
    );
    let manager = FakeManager::start(Feed::Close(body)).await;
    let agent = Agent::new(config(vec![manager.address()], get_free_port())).unwrap();

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(agent.run(shutdown.clone()));

    for _ in 0..200 {
        if manager.event_queries().len() >= 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(manager.event_queries().len() >= 3);

    shutdown.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_http_bind_failure_is_fatal() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let unreachable = format!("127.0.0.1:{}", get_free_port());
    let agent = Agent::new(config(vec![unreachable], port)).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), agent.run(CancellationToken::new()))
        .await
        .unwrap();
    match result {
        Err(Error::Startup { subsystem, .. }) => assert_eq!(subsystem, "http api"),
        other => panic!("expected startup error, got {:?}", other),
    }
    drop(taken);
}

#[test]
fn test_agent_rejects_empty_join_list() {
    assert!(matches!(
        Agent::new(config(Vec::new(), 0)),
        Err(Error::InvalidConfig(_))
    ));
}
