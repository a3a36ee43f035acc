use std::ops::RangeInclusive;

/// Rounds half-up (toward positive infinity on a tie) to `places` decimal places.
pub fn round_half_up(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (value * scale + 0.5).floor() / scale
}

/// Shortest decimal form of a current, always with a fractional part
/// (`5.0`, not `5`). Never uses exponent notation.
pub fn format_amps(value: f64) -> String {
    let s = value.to_string();
    if value.is_finite() && !s.contains('.') {
        format!("{}.0", s)
    } else {
        s
    }
}

/// Parses `"3"` or `"2-5"` into an inclusive channel range.
pub fn channel_range_parser(s: &str) -> Result<RangeInclusive<usize>, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Channel range cannot be empty".to_string());
    }

    let (first, last) = match s.split_once('-') {
        Some((a, b)) => (a.trim(), b.trim()),
        None => (s, s),
    };

    let first: usize = first
        .parse()
        .map_err(|_| format!("Invalid channel: {}", first))?;
    let last: usize = last
        .parse()
        .map_err(|_| format!("Invalid channel: {}", last))?;

    if first == 0 {
        return Err("Channels are numbered from 1".to_string());
    }
    if last < first {
        return Err(format!("Channel range {}-{} is reversed", first, last));
    }

    Ok(first..=last)
}

pub fn delimiter_parser(s: &str) -> Result<char, String> {
    match s {
        "\\t" | "tab" => return Ok('\t'),
        _ => {}
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("Delimiter must be a single character, got '{}'", s)),
    }
}
