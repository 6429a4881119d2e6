use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::shared::constants;
use crate::shared::error::TimestampError;

fn format_error(value: &str, format: &'static str) -> TimestampError {
    TimestampError::Format {
        value: value.to_string(),
        format,
    }
}

/// The capture formats end in `.%f`: a literal dot and one to six digits.
/// chrono's `%.f` would also take no fraction at all or up to nine digits.
fn has_microsecond_fraction(value: &str) -> bool {
    match value.rsplit_once('.') {
        Some((_, fraction)) => {
            (1..=6).contains(&fraction.len()) && fraction.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

pub fn parse_frame_timestamp(value: &str) -> Result<NaiveDateTime, TimestampError> {
    let format = constants::FRAME_TIMESTAMP_FORMAT;
    if !has_microsecond_fraction(value) {
        return Err(format_error(value, format));
    }
    NaiveDateTime::parse_from_str(value, format).map_err(|_| format_error(value, format))
}

pub fn parse_mission_time(value: &str) -> Result<NaiveTime, TimestampError> {
    let format = constants::MISSION_TIMESTAMP_FORMAT;
    if !has_microsecond_fraction(value) {
        return Err(format_error(value, format));
    }
    NaiveTime::parse_from_str(value, format).map_err(|_| format_error(value, format))
}

/// Seconds from `earlier` to `later`, microsecond resolution.
pub fn seconds_between(earlier: NaiveDateTime, later: NaiveDateTime) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}

/// Formats a float the way the timing logs have always been written
/// (Python `repr`): shortest round-trip digits, whole numbers keep a
/// trailing `.0`, and exponents below -4 or from 16 up use `e-06`/`e+16`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };
    if !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }

    let plain = format!("{}", value);
    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}

/// Backend ("PTG") timestamp: epoch milliseconds of `time` placed on
/// `reference`, sub-second part dropped, followed by the frame-id suffix.
pub fn to_ptg_timestamp(time: NaiveTime, reference: NaiveDate) -> Result<String, TimestampError> {
    let whole_seconds = time
        .with_nanosecond(0)
        .ok_or_else(|| TimestampError::Date(time.to_string()))?;
    let epoch = reference.and_time(whole_seconds).and_utc().timestamp();
    Ok(format!("{}{}", epoch * 1000, constants::PTG_FRAME_SUFFIX))
}

/// Numeric prefix of a PTG timestamp, used as the sort key.
pub fn ptg_sort_key(timestamp: &str) -> i64 {
    timestamp
        .split('-')
        .next()
        .and_then(|prefix| prefix.trim().parse().ok())
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frame_timestamps_with_microseconds() {
        let ts = parse_frame_timestamp("2022-09-28 17:28:35.480247").unwrap();
        assert_eq!(ts.nanosecond(), 480_247_000);
        assert!(parse_frame_timestamp("17:28:35.48").is_err());
        assert!(parse_frame_timestamp("2023-03-15 20:36:42.5").is_ok());
    }

    #[test]
    fn fraction_must_be_present_with_at_most_six_digits() {
        assert!(parse_frame_timestamp("2023-03-15 20:36:42").is_err());
        assert!(parse_frame_timestamp("2023-03-15 20:36:42.123456789").is_err());
        assert!(parse_frame_timestamp("2023-03-15 20:36:42.").is_err());
        assert!(parse_mission_time("17:29:43").is_err());
        assert!(parse_mission_time("17:29:43.1234567").is_err());
        assert!(parse_mission_time("17:29:43.123456").is_ok());
        assert!(parse_mission_time("17:29:43.1").is_ok());
    }

    #[test]
    fn seconds_between_matches_total_seconds() {
        let a = parse_frame_timestamp("2022-09-28 17:28:35.000000").unwrap();
        let b = parse_frame_timestamp("2022-09-28 17:28:36.033333").unwrap();
        assert_eq!(seconds_between(a, b), 1.033333);
        assert_eq!(seconds_between(a, a), 0.0);
    }

    #[test]
    fn float_format_keeps_trailing_zero() {
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(0.033333), "0.033333");
        assert_eq!(format_float(33.333), "33.333");
        assert_eq!(format_float(123456789.0), "123456789.0");
        assert_eq!(format_float(0.0001), "0.0001");
    }

    #[test]
    fn float_format_switches_to_exponent_like_python() {
        assert_eq!(format_float(0.000001), "1e-06");
        assert_eq!(format_float(0.000015), "1.5e-05");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(-0.00002), "-2e-05");
    }

    #[test]
    fn ptg_timestamp_uses_reference_date_and_drops_fraction() {
        let reference = NaiveDate::from_ymd_opt(2022, 9, 28).unwrap();
        let time = parse_mission_time("17:29:43.005").unwrap();
        // 2022-09-28T17:29:43Z
        assert_eq!(to_ptg_timestamp(time, reference).unwrap(), "1664386183000-0");
    }

    #[test]
    fn sort_key_reads_numeric_prefix() {
        assert_eq!(ptg_sort_key("1664386183000-0"), 1_664_386_183_000);
        assert_eq!(ptg_sort_key("garbage"), i64::MAX);
    }
}
