//! Hardware metrics collaborator
//!
//! The election core only consumes formatted strings from this module; the
//! actual sensors live behind the `MetricsProbe` trait so tests can pin
//! every node to a fixed hardware profile. The real probe reads `sysinfo`;
//! bandwidth-free has no sensor and is simulated as a random percentage.
//! A probe must never fail: missing sensors degrade to zero-valued fields.

use crate::common::{format_gb, format_ghz, format_pct, score};
use crate::protocol::{ConnectionState, DynamicMetrics, NodeRecord, NodeRole, StaticProfile};
use rand::Rng;
use std::sync::Mutex;
use sysinfo::{CpuExt, DiskExt, System, SystemExt};

/// Source of hardware attributes for the local node.
pub trait MetricsProbe: Send + Sync {
    fn hostname(&self) -> String;
    /// Captured once at join.
    fn static_profile(&self) -> StaticProfile;
    /// Refreshed on every telemetry push.
    fn dynamic_metrics(&self) -> DynamicMetrics;
}

/// Assemble a scored record for the local node.
pub fn collect_record(probe: &dyn MetricsProbe, role: NodeRole, address: &str) -> NodeRecord {
    let profile = probe.static_profile();
    let metrics = probe.dynamic_metrics();
    let score = score::calculate(&profile, &metrics);
    NodeRecord {
        role,
        address: address.to_string(),
        hostname: probe.hostname(),
        profile,
        metrics,
        score,
        connection: ConnectionState::Connected,
    }
}

/// Real probe backed by `sysinfo`.
pub struct SystemProbe {
    sys: Mutex<System>,
}

impl SystemProbe {
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        Self {
            sys: Mutex::new(sys),
        }
    }

    fn simulated_bandwidth_free() -> String {
        format_pct(rand::thread_rng().gen_range(0.0..100.0))
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProbe for SystemProbe {
    fn hostname(&self) -> String {
        let sys = self.sys.lock().unwrap();
        sys.host_name().unwrap_or_else(|| "unknown".to_string())
    }

    fn static_profile(&self) -> StaticProfile {
        let sys = self.sys.lock().unwrap();
        let cpu = sys.cpus().first();
        let processor_model = cpu
            .map(|c| c.brand().trim().to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        let processor_speed =
            format_ghz(cpu.map(|c| c.frequency() as f64 / 1000.0).unwrap_or(0.0));
        let core_count = sys
            .physical_core_count()
            .unwrap_or(0)
            .to_string();
        let total_disk: u64 = sys.disks().iter().map(|d| d.total_space()).sum();
        let disk_capacity = format_gb(total_disk as f64 / 1024.0 / 1024.0 / 1024.0);
        let os_version = sys
            .long_os_version()
            .unwrap_or_else(|| "unknown".to_string());

        StaticProfile {
            processor_model,
            processor_speed,
            core_count,
            disk_capacity,
            os_version,
        }
    }

    fn dynamic_metrics(&self) -> DynamicMetrics {
        let mut sys = self.sys.lock().unwrap();
        sys.refresh_cpu();
        sys.refresh_memory();
        sys.refresh_disks();

        let cpu_used = sys.global_cpu_info().cpu_usage() as f64;
        let cpu_free = format_pct((100.0 - cpu_used).clamp(0.0, 100.0));
        let memory_free = format_gb(sys.available_memory() as f64 / 1024.0 / 1024.0 / 1024.0);
        let free_disk: u64 = sys.disks().iter().map(|d| d.available_space()).sum();
        let disk_free = format_gb(free_disk as f64 / 1024.0 / 1024.0 / 1024.0);

        DynamicMetrics {
            cpu_free,
            memory_free,
            disk_free,
            bandwidth_free: Self::simulated_bandwidth_free(),
        }
    }
}

/// Probe returning fixed values; used by integration tests to script
/// deterministic scores.
#[derive(Debug, Clone)]
pub struct FixedProbe {
    pub hostname: String,
    pub profile: StaticProfile,
    pub metrics: DynamicMetrics,
}

impl FixedProbe {
    /// A plausible mid-range machine whose score lands near `target`
    /// by scaling the free-memory dimension.
    pub fn with_memory_free(hostname: &str, memory_free_gb: f64) -> Self {
        Self {
            hostname: hostname.to_string(),
            profile: StaticProfile {
                processor_model: "Intel Core i5".to_string(),
                processor_speed: "3.00 GHz".to_string(),
                core_count: "4".to_string(),
                disk_capacity: "500.00 GB".to_string(),
                os_version: "Linux 6.1".to_string(),
            },
            metrics: DynamicMetrics {
                cpu_free: "50.00 %".to_string(),
                memory_free: format_gb(memory_free_gb),
                disk_free: "250.00 GB".to_string(),
                bandwidth_free: "50.00 %".to_string(),
            },
        }
    }
}

impl MetricsProbe for FixedProbe {
    fn hostname(&self) -> String {
        self.hostname.clone()
    }

    fn static_profile(&self) -> StaticProfile {
        self.profile.clone()
    }

    fn dynamic_metrics(&self) -> DynamicMetrics {
        self.metrics.clone()
    }
}
