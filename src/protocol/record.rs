//! Node records: the unit of membership and telemetry
//!
//! A `NodeRecord` is one peer's known state: a static hardware profile
//! captured once at join, dynamic metrics refreshed on every telemetry push,
//! and a derived fitness score recomputed on every update. Metric fields
//! travel as display-formatted strings; the scorer sanitizes them.

use serde::{Deserialize, Serialize};

/// Role a node currently plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Leader,
    Follower,
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRole::Leader => write!(f, "Leader"),
            NodeRole::Follower => write!(f, "Follower"),
        }
    }
}

/// Connection status carried in each record and shown by the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// Hardware attributes captured once when the node joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticProfile {
    pub processor_model: String,
    /// e.g. "3.20 GHz"
    pub processor_speed: String,
    /// Physical core count, e.g. "8"
    pub core_count: String,
    /// e.g. "457.13 GB"
    pub disk_capacity: String,
    pub os_version: String,
}

/// Attributes refreshed on every telemetry push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicMetrics {
    /// e.g. "87.50 %"
    pub cpu_free: String,
    /// e.g. "16.00 GB"
    pub memory_free: String,
    /// e.g. "123.45 GB"
    pub disk_free: String,
    /// e.g. "42.00 %"
    pub bandwidth_free: String,
}

/// One peer's known state. `address` is the stable identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub role: NodeRole,
    pub address: String,
    pub hostname: String,
    pub profile: StaticProfile,
    pub metrics: DynamicMetrics,
    /// Derived; recomputed by the membership table on every upsert.
    pub score: i32,
    pub connection: ConnectionState,
}

/// One framed message on a telemetry session.
///
/// `Record` is the only variant the leader ingests; anything else is logged
/// and dropped without closing the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryMessage {
    Record(NodeRecord),
    /// Free-form status note; reserved for diagnostics.
    Status(String),
}
