//!
//! Per-node metric projection.
//!
//! Turns one merged node record into the normalized numbers and labels the
//! dashboard renders. Every function here is total: absent or zero inputs
//! degrade to documented defaults (0, "N/A", "not set"), never to an error.
use crate::format;
use crate::types::{HostRecord, LiveSnapshot, TrafficLimitType};
use crate::view::MergedNode;
use chrono::{DateTime, Utc};

/// Days-left threshold beyond which a plan counts as effectively unlimited
const LONG_TERM_DAYS: i64 = 36_500;

/// Severity of an expiry classification
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExpiryTier {
    /// Expired, or 7 days or less remaining
    Alert,
    /// Between 8 and 15 days remaining
    Warning,
    Normal,
}

/// Expiry classification of a host with an expiry timestamp set
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExpiryStatus {
    pub label: String,
    pub tier: ExpiryTier,
}

/// Display metrics for one merged node record
#[derive(Clone, Debug)]
pub struct NodeMetrics {
    /// True only with a snapshot present and its online flag set. The single
    /// source of truth for every online-dependent display.
    pub is_online: bool,
    pub cpu_usage: f64,
    /// Used memory as a percent of capacity, 0 when offline or capacity is 0
    pub mem_usage: f64,
    pub swap_usage: f64,
    pub disk_usage: f64,
    /// `"load1 | load5 | load15"` at two decimals, `"N/A"` when offline
    pub load_label: String,
    /// Consumed share of the traffic quota in percent; may exceed 100, the
    /// caller decides how to render overflow
    pub traffic_percentage: f64,
    /// Classification when an expiry timestamp is set
    pub expiry: Option<ExpiryStatus>,
    /// Expiry date for display: a date, `"long-term"` or `"not set"`
    pub expiry_label: String,
    pub uptime_label: String,
    /// Instantaneous rates as `"↑ 1.0 MiB/s ↓ 2.0 MiB/s"`, `"N/A"` offline
    pub network_label: String,
    /// Cumulative transfer as `"↑ 300.0 GiB ↓ 200.0 GiB"`, `"N/A"` offline
    pub traffic_label: String,
    pub traffic_limit_label: String,
    /// Formatted price, absent for free hosts
    pub price_label: Option<String>,
    /// Price label, expiry label, then the host's own tags
    pub tag_list: Vec<String>,
}

impl NodeMetrics {
    /// Project one merged record against the wall clock `now`
    #[must_use]
    pub fn project(node: &MergedNode<'_>, now: DateTime<Utc>) -> Self {
        let host = node.host;
        let snapshot = node.snapshot;
        let is_online = snapshot.is_some_and(|snap| snap.online);

        let cpu_usage = if is_online {
            snapshot.map_or(0.0, |snap| snap.cpu)
        } else {
            0.0
        };

        let load_label = match snapshot {
            Some(snap) if is_online => {
                format!("{:.2} | {:.2} | {:.2}", snap.load1, snap.load5, snap.load15)
            }
            _ => "N/A".to_string(),
        };

        let days = days_left(host, now);
        let expiry = days.map(classify_expiry);
        let expiry_label = match (days, host.expired_at) {
            (Some(days), _) if days >= LONG_TERM_DAYS => "long-term".to_string(),
            (Some(_), Some(at)) => at.format("%Y-%m-%d").to_string(),
            _ => "not set".to_string(),
        };

        let network_label = match snapshot {
            Some(snap) if is_online => format!(
                "↑ {} ↓ {}",
                format::format_rate(snap.net_out),
                format::format_rate(snap.net_in)
            ),
            _ => "N/A".to_string(),
        };
        let traffic_label = match snapshot {
            Some(snap) if is_online => format!(
                "↑ {} ↓ {}",
                format::format_bytes(snap.net_total_up),
                format::format_bytes(snap.net_total_down)
            ),
            _ => "N/A".to_string(),
        };

        let price_label = format::format_price(host.price, &host.currency, host.billing_cycle);

        let mut tag_list = Vec::new();
        tag_list.extend(price_label.clone());
        tag_list.extend(expiry.as_ref().map(|status| status.label.clone()));
        tag_list.extend(
            host.tags
                .split(';')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string),
        );

        Self {
            is_online,
            cpu_usage,
            mem_usage: usage_percent(is_online, snapshot.map(|s| s.ram), host.mem_total),
            swap_usage: usage_percent(is_online, snapshot.map(|s| s.swap), host.swap_total),
            disk_usage: usage_percent(is_online, snapshot.map(|s| s.disk), host.disk_total),
            load_label,
            traffic_percentage: traffic_percentage(host, snapshot, is_online),
            expiry,
            expiry_label,
            uptime_label: format::format_uptime(snapshot.map_or(0, |snap| snap.uptime)),
            network_label,
            traffic_label,
            traffic_limit_label: format::format_traffic_limit(
                host.traffic_limit,
                host.traffic_limit_type,
            ),
            price_label,
            tag_list,
        }
    }
}

/// `used / total * 100`, gated on being online and on `total > 0` so a
/// zero-capacity host can never produce NaN or infinity
fn usage_percent(is_online: bool, used: Option<u64>, total: u64) -> f64 {
    match used {
        Some(used) if is_online && total > 0 => used as f64 / total as f64 * 100.0,
        _ => 0.0,
    }
}

/// Consumed share of the traffic quota in percent, unclamped
fn traffic_percentage(host: &HostRecord, snapshot: Option<&LiveSnapshot>, is_online: bool) -> f64 {
    let Some(snap) = snapshot else { return 0.0 };
    if host.traffic_limit == 0 || !is_online {
        return 0.0;
    }

    let used = match host.traffic_limit_type {
        TrafficLimitType::Up => snap.net_total_up,
        TrafficLimitType::Down => snap.net_total_down,
        TrafficLimitType::Sum => snap.net_total_up + snap.net_total_down,
        TrafficLimitType::Min => snap.net_total_up.min(snap.net_total_down),
        TrafficLimitType::Max => snap.net_total_up.max(snap.net_total_down),
    };

    used as f64 / host.traffic_limit as f64 * 100.0
}

/// Whole days until expiry, rounded up. `None` when no expiry is set or the
/// timestamp resolves to the epoch or earlier.
fn days_left(host: &HostRecord, now: DateTime<Utc>) -> Option<i64> {
    let expiry = host.expired_at.filter(|at| at.timestamp_millis() > 0)?;
    let diff_ms = expiry.signed_duration_since(now).num_milliseconds();
    Some((diff_ms as f64 / 86_400_000.0).ceil() as i64)
}

fn classify_expiry(days: i64) -> ExpiryStatus {
    let (label, tier) = if days < 0 {
        ("expired".to_string(), ExpiryTier::Alert)
    } else if days <= 7 {
        (format!("expires in {days} days"), ExpiryTier::Alert)
    } else if days <= 15 {
        (format!("expires in {days} days"), ExpiryTier::Warning)
    } else if days < LONG_TERM_DAYS {
        (format!("expires in {days} days"), ExpiryTier::Normal)
    } else {
        ("long-term".to_string(), ExpiryTier::Normal)
    };

    ExpiryStatus { label, tier }
}
