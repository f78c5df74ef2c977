//! Human-readable durations for logs and the not-found page.

use std::time::Duration;

/// Format a millisecond figure: `µs` below 1 ms, `ms` with two decimals below
/// one second, `s` with two decimals above. Negative values keep their sign.
pub fn format_millis(ms: f64) -> String {
    let abs = ms.abs();
    if abs < 1.0 {
        format!("{:.0}µs", ms * 1000.0)
    } else if abs < 1000.0 {
        format!("{:.2}ms", ms)
    } else {
        format!("{:.2}s", ms / 1000.0)
    }
}

/// [`format_millis`] for a [`Duration`].
pub fn format_duration(d: Duration) -> String {
    format_millis(as_millis_f64(d))
}

/// Fractional milliseconds.
pub fn as_millis_f64(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
