//! Fitness scoring
//!
//! Pure, deterministic function from a node's hardware attributes to an
//! integer score. The same function runs on every role so a follower can
//! predict how the leader will rank it. Malformed numeric fields contribute
//! 0 rather than failing; ties are broken by table order, never here.

use crate::common::utils::numeric_value;
use crate::protocol::{DynamicMetrics, StaticProfile};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Known processor models and their tier contribution (0-30).
static PROCESSOR_TIERS: Lazy<HashMap<&'static str, i32>> = Lazy::new(|| {
    HashMap::from([
        ("Intel Core i7", 30),
        ("Intel Core i5", 20),
        ("Intel Core i3", 10),
        ("AMD Ryzen 7", 30),
        ("AMD Ryzen 5", 20),
        ("AMD Ryzen 3", 10),
    ])
});

/// Tier for unrecognized processor models.
const DEFAULT_TIER: i32 = 5;

// Normalization ceilings
const MAX_CORES: f64 = 16.0;
const MAX_SPEED_GHZ: f64 = 5.0;
const MAX_DISK_GB: f64 = 2000.0;
const MAX_MEMORY_GB: f64 = 32.0;

// Dimension weights
const WEIGHT_PROCESSOR: f64 = 0.5;
const WEIGHT_DISK: f64 = 0.2;
const WEIGHT_MEMORY: f64 = 0.2;
const WEIGHT_BANDWIDTH: f64 = 0.1;

/// Tier score for a processor model string.
///
/// Exact table matches win; otherwise full brand strings such as
/// "Intel(R) Core(TM) i7-9750H CPU @ 2.60GHz" fall through to a substring
/// scan over the table keys in a fixed order.
fn model_tier(model: &str) -> i32 {
    if let Some(tier) = PROCESSOR_TIERS.get(model) {
        return *tier;
    }
    // Fixed scan order so equal-priority keys resolve deterministically.
    const SCAN_ORDER: [&str; 6] = [
        "Intel Core i7",
        "Intel Core i5",
        "Intel Core i3",
        "AMD Ryzen 7",
        "AMD Ryzen 5",
        "AMD Ryzen 3",
    ];
    let compact: String = model.chars().filter(|c| c.is_alphanumeric()).collect();
    for key in SCAN_ORDER {
        let compact_key: String = key.chars().filter(|c| c.is_alphanumeric()).collect();
        if compact.contains(&compact_key) {
            return PROCESSOR_TIERS[key];
        }
    }
    DEFAULT_TIER
}

/// Compute the fitness score for one node.
///
/// Each dimension is normalized to 0-100 against a fixed ceiling, then
/// combined as a weighted sum and truncated to an integer. Never fails and
/// never returns a negative value for well-formed input.
pub fn calculate(profile: &StaticProfile, metrics: &DynamicMetrics) -> i32 {
    let cores = numeric_value(&profile.core_count);
    let core_score = (cores / MAX_CORES) * 100.0;

    let speed = numeric_value(&profile.processor_speed);
    let speed_score = (speed / MAX_SPEED_GHZ) * 100.0;

    let tier = model_tier(&profile.processor_model) as f64;

    let disk_capacity = numeric_value(&profile.disk_capacity);
    let disk_score = (disk_capacity / MAX_DISK_GB) * 100.0;

    let memory_free = numeric_value(&metrics.memory_free);
    let memory_score = (memory_free / MAX_MEMORY_GB) * 100.0;

    // Already a percentage
    let bandwidth_score = numeric_value(&metrics.bandwidth_free);

    let weighted = (tier + core_score + speed_score) * WEIGHT_PROCESSOR
        + disk_score * WEIGHT_DISK
        + memory_score * WEIGHT_MEMORY
        + bandwidth_score * WEIGHT_BANDWIDTH;

    weighted as i32
}
