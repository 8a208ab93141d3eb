//! Human-readable duration strings.
//!
//! Token lifetimes are configured with short strings such as `"7d"`,
//! `"12h"` or `"30 days"`. The grammar is a number followed by an optional
//! unit; a bare number is a count of milliseconds.
//!
//! | Unit | Accepted spellings |
//! |------|--------------------|
//! | milliseconds | `ms`, `msec`, `msecs`, `millisecond`, `milliseconds` |
//! | seconds | `s`, `sec`, `secs`, `second`, `seconds` |
//! | minutes | `m`, `min`, `mins`, `minute`, `minutes` |
//! | hours | `h`, `hr`, `hrs`, `hour`, `hours` |
//! | days | `d`, `day`, `days` |
//! | weeks | `w`, `week`, `weeks` |
//! | years | `y`, `yr`, `yrs`, `year`, `years` (365.25 days) |

use std::time::Duration;

const SECOND_MS: f64 = 1_000.0;
const MINUTE_MS: f64 = SECOND_MS * 60.0;
const HOUR_MS: f64 = MINUTE_MS * 60.0;
const DAY_MS: f64 = HOUR_MS * 24.0;
const WEEK_MS: f64 = DAY_MS * 7.0;
const YEAR_MS: f64 = DAY_MS * 365.25;

/// Parses a duration string such as `"7d"` or `"90 minutes"`.
///
/// Returns `None` when the number is missing, negative, not finite, or the
/// unit is unknown. Units are case-insensitive and may be separated from the
/// number by spaces.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use aqar_config::parse_duration;
///
/// assert_eq!(parse_duration("7d"), Some(Duration::from_secs(7 * 24 * 3600)));
/// assert_eq!(parse_duration("1500"), Some(Duration::from_millis(1500)));
/// assert_eq!(parse_duration("soon"), None);
/// ```
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    let split = input
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);

    if number.is_empty() {
        return None;
    }
    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let factor = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
        "s" | "sec" | "secs" | "second" | "seconds" => SECOND_MS,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE_MS,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR_MS,
        "d" | "day" | "days" => DAY_MS,
        "w" | "week" | "weeks" => WEEK_MS,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR_MS,
        _ => return None,
    };

    Some(Duration::from_millis((value * factor).round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_units() {
        assert_eq!(parse_duration("45s"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("30m"), Some(Duration::from_secs(1800)));
        assert_eq!(parse_duration("12h"), Some(Duration::from_secs(12 * 3600)));
        assert_eq!(parse_duration("30d"), Some(Duration::from_secs(30 * 86_400)));
        assert_eq!(parse_duration("2w"), Some(Duration::from_secs(14 * 86_400)));
    }

    #[test]
    fn test_long_units_with_spaces() {
        assert_eq!(parse_duration("7 days"), Some(Duration::from_secs(7 * 86_400)));
        assert_eq!(parse_duration(" 1 Hour "), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_bare_number_is_milliseconds() {
        assert_eq!(parse_duration("250"), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_fractional_value() {
        assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5400)));
    }

    #[test]
    fn test_year_is_a_quarter_day_longer() {
        let year = parse_duration("1y").unwrap();
        assert_eq!(year, Duration::from_secs(365 * 86_400 + 6 * 3600));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("d"), None);
        assert_eq!(parse_duration("-5d"), None);
        assert_eq!(parse_duration("7 fortnights"), None);
        assert_eq!(parse_duration("1.2.3s"), None);
    }
}
