//! Duration and timestamp conversion.
//!
//! Manifests and probe reports express time in three loosely related text
//! forms. This module converts between them:
//!
//! | Form | Example | Produced by |
//! |------|---------|-------------|
//! | fixed-width H:M:S | `"001:02:05.250"` | [`seconds_to_hms`] |
//! | H/M/S letters | `"1H2M5.250"` | [`truncated_duration_to_hms`] |
//! | truncated ISO 8601 | `"PT3725.25S"` | manifests |
//!
//! # Example
//!
//! ```
//! use mediastruct::duration::{hms_string_to_seconds, seconds_to_hms, truncated_duration_to_hms};
//!
//! assert_eq!(seconds_to_hms(3725.25), "001:02:05.250");
//! assert_eq!(truncated_duration_to_hms("PT3725.25S").as_deref(), Some("1H2M5.25"));
//! assert_eq!(hms_string_to_seconds("1H2M5.25")?, 3725.25);
//! # Ok::<(), mediastruct::MediaStructError>(())
//! ```

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, TimeDelta};
use regex::Regex;

use crate::error::MediaStructError;

static DECIMAL_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:\.(\d+))?$").expect("static pattern"));

/// Timestamp layouts accepted by [`add_duration_to_timestamp`], tried in order.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"];

/// Format a number of seconds as `HHH:MM:SS.mmm`.
///
/// Hours are zero-padded to three digits and widen instead of truncating
/// past 999. The value is rounded to the millisecond before it is split, so
/// `59.9996` becomes `"000:01:00.000"` rather than `"000:00:60.000"`.
/// Negative inputs are prefixed with `-`.
pub fn seconds_to_hms(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let total_millis = (seconds.abs() * 1000.0).round() as u64;

    let hours = total_millis / 3_600_000;
    let minutes = (total_millis / 60_000) % 60;
    let whole_seconds = (total_millis / 1000) % 60;
    let millis = total_millis % 1000;

    format!("{sign}{hours:03}:{minutes:02}:{whole_seconds:02}.{millis:03}")
}

/// Convert a truncated ISO 8601 duration into the H/M/S letter form.
///
/// Accepts `"PT12.5S"`, `"PT12S"`, `"12.5"` and `"12"`: an optional `PT`
/// prefix, an integer or decimal number of seconds, and an optional `S`
/// suffix. The fractional digits are carried over verbatim, so
/// `"PT3725.05S"` becomes `"1H2M5.05"`. A whole number gets a `.0`
/// fraction.
///
/// Returns `None` when the seconds portion is not a plain decimal number.
pub fn truncated_duration_to_hms(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let without_prefix = trimmed.strip_prefix("PT").unwrap_or(trimmed);
    let seconds_text = without_prefix.strip_suffix('S').unwrap_or(without_prefix);

    let captures = DECIMAL_SECONDS.captures(seconds_text)?;
    let whole: u64 = captures.get(1)?.as_str().parse().ok()?;
    let fraction = captures.get(2).map_or("0", |m| m.as_str());

    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let seconds = whole % 60;
    Some(format!("{hours}H{minutes}M{seconds}.{fraction}"))
}

/// Split an H/M/S duration into its `(hours, minutes, seconds)` components.
///
/// Understands both the letter form (`"1H2M5.5"`, `"2M5"`, `"5.5"`, with an
/// optional `PT` prefix and `S` suffix) and the colon form produced by
/// [`seconds_to_hms`] (`"001:02:05.500"` or `"02:05.500"`). A component
/// that does not appear contributes zero.
pub fn extract_hours_minutes_seconds(text: &str) -> Result<(u64, u64, f64), MediaStructError> {
    let malformed = || MediaStructError::MalformedDuration(text.to_string());

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(malformed());
    }

    if trimmed.contains(':') {
        let parts: Vec<&str> = trimmed.split(':').collect();
        let (hours, minutes, seconds) = match parts.as_slice() {
            [h, m, s] => (parse_whole(h), parse_whole(m), parse_seconds(s)),
            [m, s] => (Some(0), parse_whole(m), parse_seconds(s)),
            _ => return Err(malformed()),
        };
        return match (hours, minutes, seconds) {
            (Some(h), Some(m), Some(s)) => Ok((h, m, s)),
            _ => Err(malformed()),
        };
    }

    let body = trimmed.strip_prefix("PT").unwrap_or(trimmed);
    let body = body.strip_suffix('S').unwrap_or(body);

    let (hours, rest) = match body.split_once('H') {
        Some((h, rest)) => (parse_whole(h).ok_or_else(malformed)?, rest),
        None => (0, body),
    };
    let (minutes, rest) = match rest.split_once('M') {
        Some((m, rest)) => (parse_whole(m).ok_or_else(malformed)?, rest),
        None => (0, rest),
    };
    let seconds = if rest.is_empty() && body != rest {
        0.0
    } else {
        parse_seconds(rest).ok_or_else(malformed)?
    };

    Ok((hours, minutes, seconds))
}

/// Parse an H/M/S duration (letter or colon form) into seconds.
///
/// A leading `-` negates the result, which lets the output of
/// [`subtract_durations`] be parsed back.
pub fn hms_string_to_seconds(text: &str) -> Result<f64, MediaStructError> {
    let trimmed = text.trim();
    let (sign, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed),
    };
    let (hours, minutes, seconds) = extract_hours_minutes_seconds(body)?;
    Ok(sign * (hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds))
}

/// Parse a manifest duration attribute such as `"PT2S"`, `"PT1.500S"` or
/// `"PT1M30S"` into seconds.
pub fn iso_duration_to_seconds(text: &str) -> Result<f64, MediaStructError> {
    let trimmed = text.trim();
    let body = trimmed.strip_prefix("PT").unwrap_or(trimmed);
    let body = body.strip_suffix('S').unwrap_or(body);

    if body.contains('H') || body.contains('M') {
        return hms_string_to_seconds(body)
            .map_err(|_| MediaStructError::MalformedDuration(text.to_string()));
    }
    parse_seconds(body).ok_or_else(|| MediaStructError::MalformedDuration(text.to_string()))
}

/// Subtract `right` from `left` (both H/M/S strings), formatted as
/// `HHH:MM:SS.mmm`.
pub fn subtract_durations(left: &str, right: &str) -> Result<String, MediaStructError> {
    let difference = hms_string_to_seconds(left)? - hms_string_to_seconds(right)?;
    Ok(seconds_to_hms(difference))
}

/// Add two H/M/S strings, formatted as `HHH:MM:SS.mmm`.
pub fn add_durations(left: &str, right: &str) -> Result<String, MediaStructError> {
    let sum = hms_string_to_seconds(left)? + hms_string_to_seconds(right)?;
    Ok(seconds_to_hms(sum))
}

/// Offset a timestamp by an H/M/S duration.
///
/// The timestamp must carry a UTC offset and may or may not have fractional
/// seconds (`2024-05-01T10:00:00.250+10:00`, `2024-05-01T10:00:00+0000`). A
/// trailing `Z` is read as `+00:00`.
///
/// # Errors
///
/// [`MediaStructError::MalformedTimestamp`] if neither layout matches and
/// [`MediaStructError::MalformedDuration`] if the duration cannot be split
/// or the sum overflows.
pub fn add_duration_to_timestamp(
    timestamp: &str,
    duration: &str,
) -> Result<DateTime<FixedOffset>, MediaStructError> {
    let parsed = parse_offset_timestamp(timestamp)?;
    let (hours, minutes, seconds) = extract_hours_minutes_seconds(duration)?;

    let total_micros = (hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds) * 1_000_000.0;
    if !total_micros.is_finite() || total_micros > i64::MAX as f64 {
        return Err(MediaStructError::MalformedDuration(duration.to_string()));
    }
    let offset = TimeDelta::microseconds(total_micros.round() as i64);

    parsed
        .checked_add_signed(offset)
        .ok_or_else(|| MediaStructError::MalformedDuration(duration.to_string()))
}

fn parse_offset_timestamp(timestamp: &str) -> Result<DateTime<FixedOffset>, MediaStructError> {
    let trimmed = timestamp.trim();
    let normalized = match trimmed.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => trimmed.to_string(),
    };

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&normalized, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(&normalized).ok())
        .ok_or_else(|| MediaStructError::MalformedTimestamp(timestamp.to_string()))
}

fn parse_whole(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_seconds(text: &str) -> Option<f64> {
    let text = text.trim();
    if !DECIMAL_SECONDS.is_match(text) {
        return None;
    }
    text.parse().ok()
}
