//! Display collaborator
//!
//! The core pushes a descending-by-score snapshot on every membership change
//! plus free-form connection status strings on controller transitions.
//! Pushes are fire-and-forget; the core never waits on the display. The
//! bundled sink renders through `tracing` so an operator can follow role
//! changes and reconnect attempts without a separate UI.

use crate::protocol::NodeRecord;

/// Receiver for membership snapshots and status strings.
pub trait StatusSink: Send + Sync {
    /// Called on every membership table change, ordered by descending score.
    fn push_snapshot(&self, records: &[NodeRecord]);

    /// Connection/role status: "Connected", "Disconnected",
    /// "Attempting to reconnect...".
    fn connection_status(&self, status: &str);
}

/// Sink that logs snapshots and status lines.
pub struct LogSink;

impl StatusSink for LogSink {
    fn push_snapshot(&self, records: &[NodeRecord]) {
        tracing::info!("membership: {} node(s)", records.len());
        for record in records {
            tracing::info!(
                "  [{}] {} ({}) score={} cpu_free={} mem_free={} disk_free={} bw_free={} {}",
                record.role,
                record.address,
                record.hostname,
                record.score,
                record.metrics.cpu_free,
                record.metrics.memory_free,
                record.metrics.disk_free,
                record.metrics.bandwidth_free,
                record.connection,
            );
        }
    }

    fn connection_status(&self, status: &str) {
        tracing::info!("status: {}", status);
    }
}

/// Sink that drops everything; for tests that only exercise the protocol.
pub struct NullSink;

impl StatusSink for NullSink {
    fn push_snapshot(&self, _records: &[NodeRecord]) {}
    fn connection_status(&self, _status: &str) {}
}
