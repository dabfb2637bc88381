//! Configuration for minilead nodes
//!
//! Every node runs the same binary with the same configuration shape; the
//! role (leader or follower) is decided at runtime by the election
//! controller, never by config. The three well-known ports must be distinct
//! and are fixed, not negotiated.

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Cluster configuration, shared by every role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Address other peers should use to reach this node.
    /// Detected from a local interface when unset.
    #[serde(default)]
    pub advertise_ip: Option<String>,

    /// Local address sockets bind to.
    #[serde(default = "default_bind_ip")]
    pub bind_ip: String,

    /// Destination for UDP broadcasts (discovery and gossip).
    #[serde(default = "default_broadcast_addr")]
    pub broadcast_addr: String,

    /// Port A: leader IP announcements.
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,

    /// Port B: ranked candidate gossip.
    #[serde(default = "default_gossip_port")]
    pub gossip_port: u16,

    /// Port C: telemetry sessions (TCP).
    #[serde(default = "default_service_port")]
    pub service_port: u16,

    /// Interval between leader IP broadcasts.
    #[serde(default = "default_discovery_interval")]
    pub discovery_interval_secs: u64,

    /// Interval between candidate gossip broadcasts.
    #[serde(default = "default_gossip_interval")]
    pub gossip_interval_secs: u64,

    /// Interval between follower telemetry pushes.
    #[serde(default = "default_telemetry_interval")]
    pub telemetry_interval_secs: u64,

    /// Interval between leader self-metric refreshes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Interval between leader demotion evaluations.
    #[serde(default = "default_evaluation_interval")]
    pub evaluation_interval_secs: u64,

    /// Wait between follower discovery/reconnect attempts.
    #[serde(default = "default_reconnect_backoff")]
    pub reconnect_backoff_secs: u64,

    /// Graceful stop window per task during a role switch, after which the
    /// task is forcibly cancelled.
    #[serde(default = "default_teardown_grace")]
    pub teardown_grace_secs: u64,

    /// Assume leadership immediately instead of discovering first.
    ///
    /// Self-promotion requires having been ranked by a previous leader, so
    /// the very first node of a cold cluster is started with this set.
    #[serde(default)]
    pub bootstrap_leader: bool,
}

fn default_bind_ip() -> String {
    "0.0.0.0".to_string()
}
fn default_broadcast_addr() -> String {
    "255.255.255.255".to_string()
}
fn default_discovery_port() -> u16 {
    9876
}
fn default_gossip_port() -> u16 {
    9877
}
fn default_service_port() -> u16 {
    5000
}
fn default_discovery_interval() -> u64 {
    5
}
fn default_gossip_interval() -> u64 {
    5
}
fn default_telemetry_interval() -> u64 {
    3
}
fn default_refresh_interval() -> u64 {
    6
}
fn default_evaluation_interval() -> u64 {
    18
}
fn default_reconnect_backoff() -> u64 {
    4
}
fn default_teardown_grace() -> u64 {
    2
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            advertise_ip: None,
            bind_ip: default_bind_ip(),
            broadcast_addr: default_broadcast_addr(),
            discovery_port: default_discovery_port(),
            gossip_port: default_gossip_port(),
            service_port: default_service_port(),
            discovery_interval_secs: default_discovery_interval(),
            gossip_interval_secs: default_gossip_interval(),
            telemetry_interval_secs: default_telemetry_interval(),
            refresh_interval_secs: default_refresh_interval(),
            evaluation_interval_secs: default_evaluation_interval(),
            reconnect_backoff_secs: default_reconnect_backoff(),
            teardown_grace_secs: default_teardown_grace(),
            bootstrap_leader: false,
        }
    }
}

impl ClusterConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file is absent. CLI overrides are applied by the caller.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        } else {
            builder =
                builder.add_source(config::File::with_name("minilead").required(false));
        }
        let settings = builder
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings
            .try_deserialize()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// The three well-known ports must never collide.
    pub fn validate(&self) -> Result<()> {
        if self.discovery_port == self.gossip_port
            || self.discovery_port == self.service_port
            || self.gossip_port == self.service_port
        {
            return Err(Error::InvalidConfig(format!(
                "discovery ({}), gossip ({}) and service ({}) ports must be distinct",
                self.discovery_port, self.gossip_port, self.service_port
            )));
        }
        if self.reconnect_backoff_secs == 0 {
            return Err(Error::InvalidConfig(
                "reconnect_backoff_secs must be at least 1".into(),
            ));
        }
        self.bind_ip
            .parse::<IpAddr>()
            .map_err(|_| Error::InvalidConfig(format!("invalid bind_ip: {}", self.bind_ip)))?;
        Ok(())
    }

    fn bind_addr(&self, port: u16) -> SocketAddr {
        let ip: IpAddr = self
            .bind_ip
            .parse()
            .unwrap_or_else(|_| "0.0.0.0".parse().unwrap());
        SocketAddr::new(ip, port)
    }

    pub fn discovery_bind_addr(&self) -> SocketAddr {
        self.bind_addr(self.discovery_port)
    }

    pub fn gossip_bind_addr(&self) -> SocketAddr {
        self.bind_addr(self.gossip_port)
    }

    pub fn service_bind_addr(&self) -> SocketAddr {
        self.bind_addr(self.service_port)
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_secs)
    }

    pub fn gossip_interval(&self) -> Duration {
        Duration::from_secs(self.gossip_interval_secs)
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_secs(self.telemetry_interval_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn evaluation_interval(&self) -> Duration {
        Duration::from_secs(self.evaluation_interval_secs)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_secs)
    }

    pub fn teardown_grace(&self) -> Duration {
        Duration::from_secs(self.teardown_grace_secs)
    }
}
