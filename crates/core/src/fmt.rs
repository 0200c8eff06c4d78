//! Human-readable formatting helpers for logs and CLI output

use std::time::Duration;

/// Format a byte count as a readable string, e.g. `3.4 MB`
pub fn readable_bytes(num: u64) -> String {
    let mut num = num as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if num < 1024.0 {
            return format!("{:.1} {}", num, unit);
        }
        num /= 1024.0;
    }
    format!("{:.1} TB", num)
}

/// Format a duration as a readable string, e.g. `1 day 2 hours 5 minutes`
///
/// Zero-valued units are omitted; a zero duration renders as `0 seconds`.
pub fn readable_duration(duration: Duration) -> String {
    const PERIODS: [(&str, u64); 6] = [
        ("year", 60 * 60 * 24 * 365),
        ("month", 60 * 60 * 24 * 30),
        ("day", 60 * 60 * 24),
        ("hour", 60 * 60),
        ("minute", 60),
        ("second", 1),
    ];

    let mut seconds = duration.as_secs();
    if seconds == 0 {
        return "0 seconds".to_string();
    }
    let mut parts = Vec::new();
    for (name, period_seconds) in PERIODS {
        if seconds >= period_seconds {
            let value = seconds / period_seconds;
            seconds %= period_seconds;
            if value == 1 {
                parts.push(format!("1 {}", name));
            } else {
                parts.push(format!("{} {}s", value, name));
            }
        }
    }
    parts.join(" ")
}
