use std::time::Duration;

const UNITS: &[&str] = &["", "K", "M", "G", "T", "P"];
const FACTOR: f64 = 1024.0;

/// Human-readable byte count: `1536` → `1.50KB`.
///
/// Past the largest unit the scaled value keeps growing instead of failing.
pub fn format_bytes(bytes: f64) -> String {
    let mut value = if bytes.is_finite() { bytes.max(0.0) } else { 0.0 };
    let mut unit = 0;
    while value >= FACTOR && unit < UNITS.len() - 1 {
        value /= FACTOR;
        unit += 1;
    }
    format!("{value:.2}{}B", UNITS[unit])
}

pub fn format_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec))
}

/// Uptime as `H:MM:SS`, prefixed with the day count once past 24 hours.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let mins = (secs % 3600) / 60;
    let rem = secs % 60;
    match days {
        0 => format!("{hours}:{mins:02}:{rem:02}"),
        1 => format!("1 day, {hours}:{mins:02}:{rem:02}"),
        d => format!("{d} days, {hours}:{mins:02}:{rem:02}"),
    }
}

/// `part / whole` as a percentage, 0 when `whole` is 0.
pub fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
