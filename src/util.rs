/// Keep only the characters a numeric field accepts: digits and dots
pub fn numeric_chars(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Parse a user-typed seconds value. Anything malformed reads as zero.
pub fn parse_secs(text: &str) -> f64 {
    match numeric_chars(text).parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Parse a user-typed rep count. Fractions truncate, anything malformed reads as zero.
pub fn parse_count(text: &str) -> u32 {
    let secs = parse_secs(text);
    if secs >= u32::MAX as f64 {
        u32::MAX
    } else {
        secs.trunc() as u32
    }
}

/// Elapsed seconds as `HH:MM:SS`, partial seconds dropped
pub fn format_hms(secs: f64) -> String {
    hms(whole_secs(secs.floor()))
}

/// Remaining seconds as `HH:MM:SS`. Partial seconds round up so the display
/// never reads zero while time remains.
pub fn format_countdown(secs: f64) -> String {
    hms(whole_secs(secs.ceil()))
}

fn whole_secs(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    }
}

// hours keep growing past 99
fn hms(total: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
