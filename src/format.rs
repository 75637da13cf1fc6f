//!
//! Display formatting helpers.
//!
use crate::types::TrafficLimitType;

/// Human-readable byte count, binary units
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    bytesize::ByteSize(bytes).to_string_as(true)
}

/// Human-readable transfer rate
#[must_use]
pub fn format_rate(bytes_per_second: u64) -> String {
    format!("{}/s", format_bytes(bytes_per_second))
}

/// Uptime as the two most significant units
#[must_use]
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Price tag such as `"$5.00/mo"`. `None` for free hosts (price of zero or
/// below). The billing cycle arrives as a day count; the common cycles get
/// their usual suffix, anything else is shown verbatim as days.
#[must_use]
pub fn format_price(price: f64, currency: &str, billing_cycle_days: i64) -> Option<String> {
    if price <= 0.0 {
        return None;
    }
    let currency = if currency.is_empty() { "$" } else { currency };

    let cycle = match billing_cycle_days {
        27..=32 => "/mo",
        85..=95 => "/qtr",
        170..=190 => "/half-yr",
        330..=400 => "/yr",
        days if days <= 0 => "",
        days => return Some(format!("{currency}{price:.2}/{days}d")),
    };

    Some(format!("{currency}{price:.2}{cycle}"))
}

/// Label for a host's traffic quota, e.g. `"100.0 GiB (up+down)"`
#[must_use]
pub fn format_traffic_limit(limit: u64, limit_type: TrafficLimitType) -> String {
    if limit == 0 {
        return "unlimited".to_string();
    }

    let counted = match limit_type {
        TrafficLimitType::Up => "up",
        TrafficLimitType::Down => "down",
        TrafficLimitType::Sum => "up+down",
        TrafficLimitType::Min => "min",
        TrafficLimitType::Max => "max",
    };
    format!("{} ({counted})", format_bytes(limit))
}

#[cfg(test)]
mod test {
    use super::{format_price, format_traffic_limit, format_uptime};
    use crate::types::TrafficLimitType;

    #[test]
    fn uptime() {
        assert_eq!(format_uptime(0), "0m");
        assert_eq!(format_uptime(59), "0m");
        assert_eq!(format_uptime(3_660), "1h 1m");
        assert_eq!(format_uptime(90_061), "1d 1h");
    }

    #[test]
    fn price() {
        assert_eq!(format_price(0.0, "$", 30), None);
        assert_eq!(format_price(-1.0, "$", 30), None);
        assert_eq!(format_price(5.0, "$", 30).as_deref(), Some("$5.00/mo"));
        assert_eq!(format_price(12.5, "€", 365).as_deref(), Some("€12.50/yr"));
        assert_eq!(format_price(3.0, "", 90).as_deref(), Some("$3.00/qtr"));
        assert_eq!(format_price(9.0, "$", 45).as_deref(), Some("$9.00/45d"));
        assert_eq!(format_price(9.0, "$", 0).as_deref(), Some("$9.00"));
    }

    #[test]
    fn traffic_limit() {
        assert_eq!(format_traffic_limit(0, TrafficLimitType::Sum), "unlimited");
        let label = format_traffic_limit(1024 * 1024, TrafficLimitType::Sum);
        assert!(label.ends_with("(up+down)"), "{label}");
    }
}
