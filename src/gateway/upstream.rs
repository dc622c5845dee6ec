//! Backend events and the upstream registry

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendAction {
    Add,
    Del,
    Change,
}

/// A change to one backend of an upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendChange {
    pub action: BackendAction,
    pub upstream: String,
    /// Not populated by the agent yet
    pub alias: String,
    /// Not populated by the agent yet
    pub listen: String,
    pub backend: String,
    pub ip: String,
    pub port: i64,
    pub weight: f64,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Backend {
    pub id: String,
    pub ip: String,
    pub port: i64,
    pub weight: f64,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Upstream {
    pub name: String,
    pub alias: String,
    pub listen: String,
    pub backends: Vec<Backend>,
}

#[derive(Debug)]
struct UpstreamEntry {
    alias: String,
    listen: String,
    backends: BTreeMap<String, Backend>,
}

/// Upstreams keyed by app, each holding its backends keyed by task
#[derive(Debug, Default)]
pub struct UpstreamRegistry {
    upstreams: BTreeMap<String, UpstreamEntry>,
}

impl UpstreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a backend change. `change`/`del` for an unknown backend do nothing.
    pub fn apply(&mut self, event: BackendChange) {
        match event.action {
            BackendAction::Add => {
                let entry = self
                    .upstreams
                    .entry(event.upstream.clone())
                    .or_insert_with(|| UpstreamEntry {
                        alias: event.alias.clone(),
                        listen: event.listen.clone(),
                        backends: BTreeMap::new(),
                    });
                entry.backends.insert(
                    event.backend.clone(),
                    Backend {
                        id: event.backend,
                        ip: event.ip,
                        port: event.port,
                        weight: event.weight,
                        version: event.version,
                    },
                );
            }
            BackendAction::Change => {
                let Some(backend) = self
                    .upstreams
                    .get_mut(&event.upstream)
                    .and_then(|u| u.backends.get_mut(&event.backend))
                else {
                    tracing::debug!(
                        "change for unknown backend {}/{}, ignored",
                        event.upstream,
                        event.backend
                    );
                    return;
                };
                backend.ip = event.ip;
                backend.port = event.port;
                backend.weight = event.weight;
                backend.version = event.version;
            }
            BackendAction::Del => {
                let Some(entry) = self.upstreams.get_mut(&event.upstream) else {
                    tracing::debug!(
                        "delete for unknown upstream {}, ignored",
                        event.upstream
                    );
                    return;
                };
                entry.backends.remove(&event.backend);
                if entry.backends.is_empty() {
                    self.upstreams.remove(&event.upstream);
                }
            }
        }
    }

    pub fn backend(&self, upstream: &str, backend: &str) -> Option<&Backend> {
        self.upstreams.get(upstream)?.backends.get(backend)
    }

    pub fn upstreams(&self) -> Vec<Upstream> {
        self.upstreams
            .iter()
            .map(|(name, entry)| Upstream {
                name: name.clone(),
                alias: entry.alias.clone(),
                listen: entry.listen.clone(),
                backends: entry.backends.values().cloned().collect(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.upstreams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(action: BackendAction, backend: &str, weight: f64) -> BackendChange {
        BackendChange {
            action,
            upstream: "web".into(),
            alias: String::new(),
            listen: String::new(),
            backend: backend.into(),
            ip: "10.0.0.1".into(),
            port: 8080,
            weight,
            version: "v1".into(),
        }
    }

    #[test]
    fn test_add_change_del() {
        let mut registry = UpstreamRegistry::new();
        registry.apply(event(BackendAction::Add, "web-0", 100.0));
        registry.apply(event(BackendAction::Add, "web-1", 100.0));
        assert_eq!(registry.upstreams()[0].backends.len(), 2);

        registry.apply(event(BackendAction::Change, "web-1", 20.0));
        assert_eq!(registry.backend("web", "web-1").unwrap().weight, 20.0);

        registry.apply(event(BackendAction::Del, "web-0", 0.0));
        registry.apply(event(BackendAction::Del, "web-1", 0.0));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_backend_is_noop() {
        let mut registry = UpstreamRegistry::new();
        registry.apply(event(BackendAction::Change, "web-0", 50.0));
        registry.apply(event(BackendAction::Del, "web-0", 0.0));
        assert!(registry.is_empty());

        registry.apply(event(BackendAction::Add, "web-0", 100.0));
        registry.apply(event(BackendAction::Change, "web-9", 50.0));
        registry.apply(event(BackendAction::Del, "web-9", 0.0));
        assert_eq!(registry.backend("web", "web-0").unwrap().weight, 100.0);
        assert!(registry.backend("web", "web-9").is_none());
    }
}
