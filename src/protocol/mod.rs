//! Wire protocol: record types, telemetry framing, gossip text format

pub mod gossip;
pub mod record;
pub mod wire;

pub use record::{
    ConnectionState, DynamicMetrics, NodeRecord, NodeRole, StaticProfile, TelemetryMessage,
};
pub use wire::{read_message, write_message, MAX_FRAME_LEN};
