//! Resolver record changes and the record table they are applied to

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops::BitOr;

/// DNS record type flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordType(u8);

impl RecordType {
    pub const A: RecordType = RecordType(0b01);
    pub const SRV: RecordType = RecordType(0b10);
    /// Address plus service record for replicated apps
    pub const A_SRV: RecordType = RecordType(Self::A.0 | Self::SRV.0);

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: RecordType) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for RecordType {
    type Output = RecordType;

    fn bitor(self, rhs: RecordType) -> RecordType {
        RecordType(self.0 | rhs.0)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.contains(Self::A), self.contains(Self::SRV)) {
            (true, true) => write!(f, "A+SRV"),
            (true, false) => write!(f, "A"),
            (false, true) => write!(f, "SRV"),
            (false, false) => write!(f, "NONE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    Add,
    Del,
}

/// A change to the resolver's records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverRecordChange {
    pub change: Change,
    pub record_type: RecordType,
    pub ip: String,
    /// Only set for combined A+SRV records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    pub cluster: String,
    pub run_as: String,
    pub app_name: String,
    pub instance_name: String,
    pub slot_id: String,
    pub weight: f64,
    /// Address of the local gateway rather than a task
    #[serde(default)]
    pub is_proxy: bool,
}

impl ResolverRecordChange {
    /// Announce (or withdraw) the gateway's own address
    pub fn proxy(change: Change, ip: impl Into<String>) -> Self {
        Self {
            change,
            record_type: RecordType::A,
            ip: ip.into(),
            port: None,
            cluster: String::new(),
            run_as: String::new(),
            app_name: String::new(),
            instance_name: String::new(),
            slot_id: String::new(),
            weight: 0.0,
            is_proxy: true,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            cluster: self.cluster.clone(),
            run_as: self.run_as.clone(),
            app_name: self.app_name.clone(),
            instance_name: self.instance_name.clone(),
            slot_id: self.slot_id.clone(),
            record_type: self.record_type,
        }
    }
}

/// Identity of a logical record; repeated changes with the same key collapse
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub cluster: String,
    pub run_as: String,
    pub app_name: String,
    pub instance_name: String,
    pub slot_id: String,
    pub record_type: RecordType,
}

/// A record currently served
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub cluster: String,
    pub run_as: String,
    pub app_name: String,
    pub instance_name: String,
    pub slot_id: String,
    pub record_type: RecordType,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    pub weight: f64,
}

/// Resolver state: task records plus gateway addresses
#[derive(Debug, Default)]
pub struct RecordTable {
    records: HashMap<RecordKey, Record>,
    proxies: BTreeSet<String>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a change. Adds overwrite, deletes of absent records are no-ops.
    pub fn apply(&mut self, change: ResolverRecordChange) {
        if change.is_proxy {
            match change.change {
                Change::Add => {
                    self.proxies.insert(change.ip);
                }
                Change::Del => {
                    self.proxies.remove(&change.ip);
                }
            }
            return;
        }

        let key = change.key();
        match change.change {
            Change::Add => {
                let record = Record {
                    cluster: change.cluster,
                    run_as: change.run_as,
                    app_name: change.app_name,
                    instance_name: change.instance_name,
                    slot_id: change.slot_id,
                    record_type: change.record_type,
                    ip: change.ip,
                    port: change.port,
                    weight: change.weight,
                };
                self.records.insert(key, record);
            }
            Change::Del => {
                if self.records.remove(&key).is_none() {
                    tracing::debug!("delete for unknown record {:?}, ignored", key);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by key
    pub fn records(&self) -> Vec<Record> {
        let mut entries: Vec<_> = self.records.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn proxies(&self) -> Vec<String> {
        self.proxies.iter().cloned().collect()
    }
}
