//! Human-friendly durations for command-line flags.

use std::time::Duration;

/// Parses a duration such as `30s`, `15m`, `1h`, `2d` or `1w`.
///
/// A bare number is read as seconds, so `0` disables a window. Usable
/// directly as a clap `value_parser`.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return Err("duration cannot be empty".to_string());
    }

    let split = input
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(input.len());
    if split == 0 {
        return Err(format!("'{}' must start with a number", input));
    }

    let (number, unit) = input.split_at(split);
    let number: f64 = number
        .parse()
        .map_err(|_| format!("invalid number in duration: '{}'", number))?;

    let seconds = match unit.trim() {
        "" | "s" | "sec" | "second" | "seconds" => number,
        "m" | "min" | "minute" | "minutes" => number * 60.0,
        "h" | "hr" | "hour" | "hours" => number * 3600.0,
        "d" | "day" | "days" => number * 86400.0,
        "w" | "week" | "weeks" => number * 604800.0,
        other => {
            return Err(format!(
                "invalid duration unit: '{}'. Valid units: s, m, h, d, w",
                other
            ))
        }
    };

    Duration::try_from_secs_f64(seconds)
        .map_err(|e| format!("duration '{}' is out of range: {}", input, e))
}
