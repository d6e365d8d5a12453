//! Formatting helpers for log lines.

use tide_types::ETHER;

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Format a raw amount as whole units with up to four decimals, truncated.
pub fn format_ether(raw: u128) -> String {
    let whole = raw / ETHER;
    let frac = (raw % ETHER) / (ETHER / 10_000);
    if frac == 0 {
        format!("{}", whole)
    } else {
        let s = format!("{:04}", frac);
        format!("{}.{}", whole, s.trim_end_matches('0'))
    }
}
