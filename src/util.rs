pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Render milliseconds as `M:SS.CC` from one minute up, `S.CC` below.
/// Centiseconds are truncated.
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    let minutes = total_secs / 60;
    let secs = total_secs % 60;
    let cs = (ms % 1000) / 10;

    if minutes > 0 {
        format!("{minutes}:{secs:02}.{cs:02}")
    } else {
        format!("{secs}.{cs:02}")
    }
}
