//! # minilead
//!
//! Self-organizing leader election for a broadcast domain: every node
//! scores its own hardware (CPU, memory, disk, bandwidth) and the cluster
//! continuously re-elects the fittest node as leader, with no fixed
//! coordinator and no consensus protocol.
//!
//! ## Architecture
//!
//! ```text
//!                ┌──────────────────────────────┐
//!                │            Leader            │
//!                │  - UDP discovery broadcast   │──▶ port A (9876)
//!                │  - UDP candidate gossip      │──▶ port B (9877)
//!                │  - TCP telemetry ingestion   │◀── port C (5000)
//!                │  - membership table + scores │
//!                │  - demotion evaluation (18s) │
//!                └──────────────┬───────────────┘
//!                               │ telemetry (TCP, 3s)
//!              ┌────────────────┼────────────────┐
//!        ┌─────▼─────┐    ┌─────▼─────┐    ┌─────▼─────┐
//!        │ Follower  │    │ Follower  │    │ Follower  │
//!        │ + gossip  │    │ + gossip  │    │ + gossip  │
//!        │  listener │    │  listener │    │  listener │
//!        └───────────┘    └───────────┘    └───────────┘
//! ```
//!
//! Every node runs the same binary. A node starts by discovering the
//! current leader over broadcast UDP and pushing telemetry to it; when the
//! leader dies or demotes itself, the best-ranked follower (per the last
//! candidate gossip) promotes itself in-place. Brief leaderless or
//! multi-leader windows are tolerated by design; the protocol aims for
//! eventual, not immediate, agreement.
//!
//! ## Usage
//!
//! ```bash
//! minilead serve
//! minilead serve --advertise-ip 192.168.1.20 --service-port 5000
//! ```

pub mod common;
pub mod display;
pub mod follower;
pub mod leader;
pub mod metrics;
pub mod node;
pub mod protocol;

// Re-export commonly used types
pub use common::{ClusterConfig, Error, Result};
pub use display::{LogSink, NullSink, StatusSink};
pub use leader::MembershipTable;
pub use metrics::{MetricsProbe, SystemProbe};
pub use node::{Node, RoleState};
pub use protocol::{NodeRecord, NodeRole};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
