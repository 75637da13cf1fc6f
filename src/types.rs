//!
//! Types returned from the dashboard APIs.
//!
//! NOTE: The types here are not exhaustive to the APIs.
use serde::Deserialize;

/// Map from host uuid to its most recent snapshot, as delivered by the push
/// channel. Every push message carries a full map, never a partial patch.
pub type SnapshotMap = std::collections::HashMap<String, LiveSnapshot>;

/// Policy selecting which traffic counter counts against a host's byte quota
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLimitType {
    /// Upload bytes
    Up,
    /// Download bytes
    Down,
    /// Upload + download
    Sum,
    /// The smaller of the two counters
    Min,
    /// The larger of the two counters. Also the fallback for any value this
    /// client does not recognize; the server does not validate the field.
    #[default]
    #[serde(other)]
    Max,
}

/// One monitored host as configured on the server.
///
/// Returned from `v1/nodes`. Immutable between directory refreshes.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct HostRecord {
    /// Opaque unique host identity
    pub uuid: String,
    /// Display name
    pub name: String,
    /// Group label, may be empty
    #[serde(default)]
    pub group: String,
    /// Ordering weight, lower sorts first
    #[serde(default)]
    pub weight: i64,
    /// Region code
    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub cpu_name: String,
    #[serde(default)]
    pub cpu_cores: u32,
    #[serde(default)]
    pub arch: String,
    #[serde(default)]
    pub virtualization: String,
    #[serde(default)]
    pub gpu_name: String,
    /// OS descriptor string
    #[serde(default)]
    pub os: String,

    /// Memory capacity in bytes
    #[serde(default)]
    pub mem_total: u64,
    /// Swap capacity in bytes, 0 when swap is off
    #[serde(default)]
    pub swap_total: u64,
    /// Disk capacity in bytes
    #[serde(default)]
    pub disk_total: u64,

    /// Byte threshold for traffic accounting, 0 meaning unlimited
    #[serde(default)]
    pub traffic_limit: u64,
    #[serde(default)]
    pub traffic_limit_type: TrafficLimitType,

    /// Plan expiry; `None` or the epoch mean "not set"
    #[serde(default)]
    pub expired_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub currency: String,
    /// Billing cycle length in days
    #[serde(default)]
    pub billing_cycle: i64,

    /// Semicolon-delimited free-text tags
    #[serde(default)]
    pub tags: String,
}

/// One point-in-time metrics reading for a host, pushed over the live channel
/// and also returned from `v1/node/{uuid}/recent-stats`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LiveSnapshot {
    /// Whether the agent currently reports in
    #[serde(default)]
    pub online: bool,
    /// Instantaneous CPU usage percent
    #[serde(default)]
    pub cpu: f64,
    /// Memory used in bytes
    #[serde(default)]
    pub ram: u64,
    /// Swap used in bytes
    #[serde(default)]
    pub swap: u64,
    /// Disk used in bytes
    #[serde(default)]
    pub disk: u64,

    /// 1 minute load average
    #[serde(default, rename = "load")]
    pub load1: f64,
    /// 5 minutes load average
    #[serde(default)]
    pub load5: f64,
    /// 15 minutes load average
    #[serde(default)]
    pub load15: f64,

    /// Instantaneous download rate in bytes/s
    #[serde(default)]
    pub net_in: u64,
    /// Instantaneous upload rate in bytes/s
    #[serde(default)]
    pub net_out: u64,
    /// Cumulative bytes uploaded
    #[serde(default)]
    pub net_total_up: u64,
    /// Cumulative bytes downloaded
    #[serde(default)]
    pub net_total_down: u64,

    /// Uptime in seconds
    #[serde(default)]
    pub uptime: u64,
    /// Server timestamp of this reading, the epoch when absent
    #[serde(default)]
    pub time: chrono::DateTime<chrono::Utc>,
}

/// Returned from `v1/node/{uuid}/load-history`
#[derive(Clone, Debug, Deserialize)]
pub struct LoadHistory {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub records: Vec<LoadRecord>,
}

/// One entry of a host's load history series
#[derive(Clone, Debug, Deserialize)]
pub struct LoadRecord {
    pub time: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub ram: u64,
    #[serde(default)]
    pub swap: u64,
    #[serde(default)]
    pub disk: u64,
    #[serde(default, rename = "load")]
    pub load1: f64,
    #[serde(default)]
    pub net_in: u64,
    #[serde(default)]
    pub net_out: u64,
}

/// Returned from `v1/node/{uuid}/ping-history`
#[derive(Clone, Debug, Deserialize)]
pub struct PingHistory {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub records: Vec<PingRecord>,
    #[serde(default)]
    pub tasks: Vec<PingTask>,
}

/// One latency measurement
#[derive(Clone, Debug, Deserialize)]
pub struct PingRecord {
    pub task_id: u64,
    pub time: chrono::DateTime<chrono::Utc>,
    /// Round-trip time in milliseconds, negative when the probe timed out
    pub value: i64,
}

/// A configured latency probe
#[derive(Clone, Debug, Deserialize)]
pub struct PingTask {
    pub id: u64,
    pub name: String,
    /// Probe interval in seconds
    #[serde(default)]
    pub interval: u64,
}
