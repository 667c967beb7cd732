//! Clock string conversions for `[%clk H:MM:SS]` annotations.

/// Parse an `H:MM:SS` clock string into whole seconds.
/// Returns `None` for anything that is not three colon-separated numbers.
pub fn clock_to_seconds(clock: &str) -> Option<u32> {
    let mut parts = clock.split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    let seconds: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Format remaining time for display: `H:MM:SS` while hours remain,
/// `M:SS` under an hour, `0:00` when exhausted.
pub fn format_clock(seconds: u32) -> String {
    if seconds == 0 {
        return "0:00".to_string();
    }
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;

    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
