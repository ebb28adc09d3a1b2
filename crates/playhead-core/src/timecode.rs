//! Frame-accurate timecodes
//!
//! Converts between seconds and `H:MM:SS:FF` strings and parses start-time
//! strings from untrusted input (URL parameters) into milliseconds.
//!
//! The seconds-to-timecode carry is intentionally shallow: when frames round
//! up to a full second, seconds are incremented, and when that makes seconds
//! reach 60, minutes are incremented. Seconds are not wrapped and minutes
//! never carry into hours, so `59.999` at 30 fps renders as `0:01:60:00`.

use crate::{duration::parse_duration, Error, Result};
use std::fmt;
use std::str::FromStr;

/// Frame rate used when none is given
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// A decomposed timecode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timecode {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub frames: u64,
    pub negative: bool,
}

impl Timecode {
    /// Decompose a time in seconds. Returns `None` for NaN.
    pub fn from_seconds(time: f64, frame_rate: f64) -> Option<Self> {
        if time.is_nan() {
            return None;
        }

        // Values that round to zero at millisecond precision are not negative
        let negative = (time * 1000.0).round() / 1000.0 < 0.0;
        let time = time.abs();

        let total_seconds = time.floor();
        let fractional = time % 1.0;

        let hours = (total_seconds / 3600.0).floor() as u64;
        let mut minutes = (total_seconds / 60.0).floor() as u64 % 60;
        let mut seconds = total_seconds as u64 % 60;
        let mut frames = (frame_rate * fractional).round() as u64;

        if frames >= frame_rate.round() as u64 {
            frames = 0;
            seconds += 1;
            if seconds >= 60 {
                minutes += 1;
            }
        }

        Some(Self {
            hours,
            minutes,
            seconds,
            frames,
            negative,
        })
    }

    /// Total seconds represented by this timecode
    pub fn to_seconds(&self, frame_rate: f64) -> f64 {
        let magnitude = self.hours as f64 * 3600.0
            + self.minutes as f64 * 60.0
            + self.seconds as f64
            + self.frames as f64 / frame_rate;
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "(-")?;
        }
        write!(
            f,
            "{}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )?;
        if self.negative {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl FromStr for Timecode {
    type Err = Error;

    /// Strict parse of a (possibly short) timecode; every field must be digits
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidTimecode(s.to_string());
        let canonical = validate_timecode(s).ok_or_else(invalid)?;
        let mut fields = canonical
            .split(':')
            .map(|field| field.parse::<u64>().map_err(|_| invalid()));

        let mut next = || fields.next().unwrap_or(Ok(0));
        Ok(Self {
            hours: next()?,
            minutes: next()?,
            seconds: next()?,
            frames: next()?,
            negative: false,
        })
    }
}

/// Format seconds as `H:MM:SS:FF`, or `(-H:MM:SS:FF)` when negative.
///
/// Returns `None` when `time` is NaN.
pub fn seconds_to_timecode(time: f64, frame_rate: f64) -> Option<String> {
    Timecode::from_seconds(time, frame_rate).map(|tc| tc.to_string())
}

/// Convert a timecode string to seconds.
///
/// Fields are read right to left (frames, seconds, minutes, hours), so short
/// forms such as `"30:15"` (seconds and frames) are accepted. A field that
/// does not start with a number counts as zero.
pub fn timecode_to_seconds(code: &str, frame_rate: f64) -> f64 {
    let mut fields = code.split(':').rev().map(parse_int_prefix);
    let frames = fields.next().unwrap_or(0);
    let seconds = fields.next().unwrap_or(0);
    let minutes = fields.next().unwrap_or(0);
    let hours = fields.next().unwrap_or(0);

    // Fields come from untrusted input and may be arbitrarily large
    hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds as f64 + frames as f64 / frame_rate
}

/// Normalize a timecode to exactly four colon-separated fields.
///
/// Missing leading fields become `00`, extra leading fields are dropped.
/// Returns `None` if any kept field is not made of ASCII digits only.
pub fn validate_timecode(raw: &str) -> Option<String> {
    let chunks: Vec<&str> = raw.split(':').collect();
    let mut fields = ["00"; 4];
    for (slot, chunk) in fields.iter_mut().rev().zip(chunks.iter().rev()) {
        *slot = chunk;
    }

    if fields
        .iter()
        .all(|field| !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit()))
    {
        Some(fields.join(":"))
    } else {
        None
    }
}

/// Parse a start-time string into milliseconds.
///
/// Tries a duration string first (`1.5s`, `5m`, `1000`), then a timecode,
/// and falls back to `0` for anything else.
pub fn parse_duration_to_millis(raw: &str, frame_rate: f64) -> f64 {
    if let Some(millis) = parse_duration(raw).filter(|ms| ms.is_finite()) {
        return millis.floor();
    }

    match validate_timecode(raw) {
        Some(code) => timecode_to_seconds(&code, frame_rate) * 1000.0,
        None => {
            tracing::debug!(input = raw, "Unparseable start time, using 0");
            0.0
        }
    }
}

/// Simplified `[H:]M:SS` display of a time in milliseconds
pub fn format_basic_time(millis: f64) -> String {
    let total_seconds = (millis / 1000.0).floor().max(0.0) as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        if minutes == 0 {
            format!("{}:00:{:02}", hours, seconds)
        } else {
            format!("{}:{}:{:02}", hours, minutes, seconds)
        }
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Integer prefix of a field: optional whitespace and sign, then digits
fn parse_int_prefix(field: &str) -> i64 {
    let trimmed = field.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    rest[..digits].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.005,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_timecode_to_seconds() {
        assert_close(timecode_to_seconds("0:00:14:01", 30.0), 14.033);
        assert_close(timecode_to_seconds("0:00:14:01", 60.0), 14.016);
        assert_close(timecode_to_seconds("0:01:30:15", 30.0), 90.5);
        assert_close(timecode_to_seconds("30:15", 30.0), 30.5);
        assert_close(timecode_to_seconds("15", 30.0), 0.5);
        assert_close(timecode_to_seconds("1:1:0:0", 30.0), 3660.0);
    }

    #[test]
    fn test_timecode_to_seconds_lenient_fields() {
        assert_close(timecode_to_seconds("abc:10:00", 30.0), 10.0);
        assert_close(timecode_to_seconds("", 30.0), 0.0);
        assert_close(timecode_to_seconds("1.9:00", 30.0), 1.0);
    }

    #[test]
    fn test_seconds_to_timecode() {
        let cases = [
            (14.03, 30.0, "0:00:14:01"),
            (14.016, 60.0, "0:00:14:01"),
            (90.5, 30.0, "0:01:30:15"),
            (30.5, 30.0, "0:00:30:15"),
            (0.5, 30.0, "0:00:00:15"),
            (3660.0, 30.0, "1:01:00:00"),
        ];
        for (time, frame_rate, expected) in cases {
            assert_eq!(seconds_to_timecode(time, frame_rate).as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_nan_is_undefined() {
        assert_eq!(seconds_to_timecode(f64::NAN, 30.0), None);
    }

    #[test]
    fn test_negative_time() {
        assert_eq!(seconds_to_timecode(-1.5, 30.0).as_deref(), Some("(-0:00:01:15)"));
        // Less than half a millisecond below zero is not negative
        assert_eq!(seconds_to_timecode(-0.0001, 30.0).as_deref(), Some("0:00:00:00"));
    }

    #[test]
    fn test_frame_carry() {
        assert_eq!(seconds_to_timecode(0.999, 30.0).as_deref(), Some("0:00:01:00"));
        let tc = Timecode::from_seconds(0.999, 30.0).unwrap();
        assert!(tc.frames < 30);
    }

    #[test]
    fn test_carry_does_not_cascade() {
        assert_eq!(seconds_to_timecode(59.999, 30.0).as_deref(), Some("0:01:60:00"));
        assert_eq!(seconds_to_timecode(3599.999, 30.0).as_deref(), Some("0:60:60:00"));
    }

    #[test]
    fn test_round_trip_within_a_frame() {
        for frame_rate in [24.0, 25.0, 29.97, 30.0, 60.0] {
            let mut time = 0.0;
            while time < 3600.0 {
                // Skip the last frame of a minute, where the carry quirk applies
                let code = seconds_to_timecode(time, frame_rate).unwrap();
                if !code.contains(":60:") {
                    let back = timecode_to_seconds(&code, frame_rate);
                    assert!(
                        (back - time).abs() <= 1.0 / frame_rate,
                        "{time} -> {code} -> {back} at {frame_rate}"
                    );
                }
                time += 7.3379;
            }
        }
    }

    #[test]
    fn test_validate_timecode() {
        assert_eq!(validate_timecode("0:01").as_deref(), Some("00:00:0:01"));
        assert_eq!(validate_timecode("9:0:01:00:01").as_deref(), Some("0:01:00:01"));
        assert_eq!(validate_timecode("1:a:00"), None);
        assert_eq!(validate_timecode("1::00"), None);
        assert_eq!(validate_timecode("1.5"), None);
    }

    #[test]
    fn test_parse_duration_to_millis() {
        assert_close(parse_duration_to_millis("0:00:14:00", 29.97), 14000.0);
        assert_close(parse_duration_to_millis("0:00:14:01", 29.97), 14033.366);
        assert_close(parse_duration_to_millis("0:01:00:01", 60.0), 60016.666);
        assert_close(parse_duration_to_millis("0:01", 60.0), 16.666);
        assert_close(parse_duration_to_millis("1000", 30.0), 1000.0);
        assert_close(parse_duration_to_millis("1.5s", 60.0), 1500.0);
        assert_close(parse_duration_to_millis("5m", 60.0), 300000.0);
        assert_eq!(parse_duration_to_millis("garbage!!", 30.0), 0.0);
    }

    #[test]
    fn test_huge_fields_do_not_overflow() {
        let seconds = timecode_to_seconds("9999999999999999:0:0:0", 30.0);
        assert!(seconds.is_finite());
        assert_eq!(seconds, 9999999999999999.0 * 3600.0);

        let millis = parse_duration_to_millis("9999999999999999:00:00:00", 30.0);
        assert!(millis.is_finite() && millis > 0.0);

        let tc: Timecode = "18446744073709551615:00:00:00".parse().unwrap();
        assert!(tc.to_seconds(30.0).is_finite());
    }

    #[test]
    fn test_timecode_from_str() {
        let tc: Timecode = "1:02:03:04".parse().unwrap();
        assert_eq!((tc.hours, tc.minutes, tc.seconds, tc.frames), (1, 2, 3, 4));
        assert_eq!(tc.to_string(), "1:02:03:04");
        assert!("1:xx:03".parse::<Timecode>().is_err());
    }

    #[test]
    fn test_format_basic_time() {
        assert_eq!(format_basic_time(0.0), "0:00");
        assert_eq!(format_basic_time(5_000.0), "0:05");
        assert_eq!(format_basic_time(65_000.0), "1:05");
        assert_eq!(format_basic_time(3_605_000.0), "1:00:05");
        assert_eq!(format_basic_time(3_725_000.0), "1:2:05");
    }
}
