//! Task lifecycle events as published on the manager's event feed

use serde::{Deserialize, Serialize};
use std::fmt;

/// Event type labels the agent acts on; every other label is ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    TaskHealthy,
    TaskUnhealthy,
    TaskWeightChange,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::TaskHealthy,
        EventKind::TaskUnhealthy,
        EventKind::TaskWeightChange,
    ];

    /// Map a wire label to a recognized kind
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::TaskHealthy => "TaskHealthy",
            EventKind::TaskUnhealthy => "TaskUnhealthy",
            EventKind::TaskWeightChange => "TaskWeightChange",
        }
    }

    /// Only health transitions carry resolver meaning
    pub fn affects_resolver(&self) -> bool {
        matches!(self, EventKind::TaskHealthy | EventKind::TaskUnhealthy)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A recognized record lifted off the wire, payload still undecoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStreamFrame {
    pub kind: EventKind,
    pub payload: Vec<u8>,
}

impl RawStreamFrame {
    pub fn new(kind: EventKind, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    pub fn decode(&self) -> crate::Result<TaskLifecycleEvent> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

/// How an application's instances are deployed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Mode {
    #[default]
    Single,
    Replicated,
}

impl From<String> for Mode {
    fn from(s: String) -> Self {
        match s.as_str() {
            // older managers publish "replicates"
            "replicated" | "replicates" => Mode::Replicated,
            _ => Mode::Single,
        }
    }
}

impl From<Option<String>> for Mode {
    fn from(s: Option<String>) -> Self {
        s.map(Mode::from).unwrap_or_default()
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Single => "single".to_string(),
            Mode::Replicated => "replicated".to_string(),
        }
    }
}

/// Decoded `data:` payload of a task lifecycle event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskLifecycleEvent {
    #[serde(rename = "AppID")]
    pub app_id: String,
    #[serde(rename = "TaskID")]
    pub task_id: String,
    #[serde(rename = "InstanceName")]
    pub instance_name: String,
    #[serde(rename = "SlotIndex")]
    pub slot_index: i64,
    #[serde(rename = "ClusterID")]
    pub cluster_id: String,
    #[serde(rename = "RunAs")]
    pub run_as: String,
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "Port")]
    pub port: i64,
    #[serde(rename = "Weight")]
    pub weight: f64,
    #[serde(rename = "VersionID")]
    pub version_id: String,
    #[serde(rename = "Mode")]
    pub mode: Mode,
    #[serde(rename = "GatewayEnabled")]
    pub gateway_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_labels() {
        assert_eq!(EventKind::from_label("TaskHealthy"), Some(EventKind::TaskHealthy));
        assert_eq!(
            EventKind::from_label("TaskWeightChange"),
            Some(EventKind::TaskWeightChange)
        );
        assert_eq!(EventKind::from_label("TaskCreated"), None);
        assert_eq!(EventKind::from_label("taskhealthy"), None);

        assert!(EventKind::TaskUnhealthy.affects_resolver());
        assert!(!EventKind::TaskWeightChange.affects_resolver());
    }

    #[test]
    fn test_decode_payload() {
        let frame = RawStreamFrame::new(
            EventKind::TaskHealthy,
            r#"{"AppID":"web","TaskID":"web-0-abc","InstanceName":"web","SlotIndex":0,
                "ClusterID":"c1","RunAs":"ops","IP":"10.1.1.5","Port":8080,"Weight":100,
                "VersionID":"v1","Mode":"replicated","GatewayEnabled":true}"#,
        );
        let event = frame.decode().unwrap();
        assert_eq!(event.app_id, "web");
        assert_eq!(event.port, 8080);
        assert_eq!(event.weight, 100.0);
        assert_eq!(event.mode, Mode::Replicated);
        assert!(event.gateway_enabled);
    }

    #[test]
    fn test_mode_spellings() {
        assert_eq!(Mode::from("replicates".to_string()), Mode::Replicated);
        assert_eq!(Mode::from("fixed".to_string()), Mode::Single);
        assert_eq!(String::from(Mode::Replicated), "replicated");
    }

    #[test]
    fn test_decode_null_or_missing_mode() {
        let frame = RawStreamFrame::new(EventKind::TaskHealthy, r#"{"AppID":"web","Mode":null}"#);
        assert_eq!(frame.decode().unwrap().mode, Mode::Single);

        let frame = RawStreamFrame::new(EventKind::TaskHealthy, r#"{"AppID":"web"}"#);
        assert_eq!(frame.decode().unwrap().mode, Mode::Single);
    }

    #[test]
    fn test_decode_out_of_range_numbers() {
        let frame = RawStreamFrame::new(
            EventKind::TaskWeightChange,
            r#"{"AppID":"web","SlotIndex":-1,"Port":70000,"Weight":5}"#,
        );
        let event = frame.decode().unwrap();
        assert_eq!(event.slot_index, -1);
        assert_eq!(event.port, 70000);
    }

    #[test]
    fn test_decode_malformed() {
        let frame = RawStreamFrame::new(EventKind::TaskHealthy, " {\"AppID\": ");
        assert!(matches!(frame.decode(), Err(crate::Error::Decode(_))));

        let frame = RawStreamFrame::new(EventKind::TaskHealthy, r#"{"Port":"eighty"}"#);
        assert!(frame.decode().is_err());
    }
}
