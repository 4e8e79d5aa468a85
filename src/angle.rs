//! Degrees-minutes-seconds text form of latitude/longitude.
//!
//! The logger writes angles the way the station position library prints them,
//! e.g. `51deg 30' 26.4"` or `-0deg 07' 39.9"`, and the analysis side turns
//! them back into decimal degrees.

use crate::error::{LoggerError, Result};

const TENTHS_PER_DEGREE: i64 = 36_000;
const TENTHS_PER_MINUTE: i64 = 600;

/// Render decimal degrees as `{d}deg {mm}' {ss.s}"`, rounded to 0.1 arcsecond
pub fn format_dms(degrees: f64) -> String {
    let sign = if degrees < 0.0 { "-" } else { "" };
    let tenths = (degrees.abs() * TENTHS_PER_DEGREE as f64).round() as i64;
    let d = tenths / TENTHS_PER_DEGREE;
    let m = (tenths % TENTHS_PER_DEGREE) / TENTHS_PER_MINUTE;
    let s_tenths = tenths % TENTHS_PER_MINUTE;
    // No "-0deg 00' 00.0"" for values that round to zero
    let sign = if tenths == 0 { "" } else { sign };
    format!("{}{}deg {:02}' {:02}.{}\"", sign, d, m, s_tenths / 10, s_tenths % 10)
}

/// Parse a DMS string back to decimal degrees.
///
/// Accepts `51deg 30' 26.4"`, missing minute/second parts, and plain decimal
/// numbers. A leading `-` applies to the whole angle.
pub fn dms_to_decimal(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LoggerError::InvalidAngle("empty angle".to_string()));
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        return Ok(value);
    }

    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };

    let invalid = || LoggerError::InvalidAngle(text.to_string());
    let mut parts = body.split_whitespace();

    let degrees: f64 = parts
        .next()
        .and_then(|p| p.strip_suffix("deg"))
        .and_then(|p| p.parse().ok())
        .ok_or_else(invalid)?;
    let minutes: f64 = match parts.next() {
        Some(p) => p.strip_suffix('\'').and_then(|p| p.parse().ok()).ok_or_else(invalid)?,
        None => 0.0,
    };
    let seconds: f64 = match parts.next() {
        Some(p) => p.strip_suffix('"').and_then(|p| p.parse().ok()).ok_or_else(invalid)?,
        None => 0.0,
    };
    if parts.next().is_some() || degrees < 0.0 || !(0.0..60.0).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return Err(invalid());
    }

    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    Ok(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_dms() {
        assert_eq!(format_dms(51.5073), "51deg 30' 26.3\"");
        assert_eq!(format_dms(-0.1278), "-0deg 07' 40.1\"");
        assert_eq!(format_dms(0.0), "0deg 00' 00.0\"");
        assert_eq!(format_dms(-0.00000001), "0deg 00' 00.0\"");
    }

    #[test]
    fn test_format_dms_carries_rounding() {
        // 59.99 arcseconds rounds up into the next minute
        assert_eq!(format_dms(10.0 + 59.0 / 60.0 + 59.99 / 3600.0), "11deg 00' 00.0\"");
    }

    #[test]
    fn test_dms_to_decimal() {
        let v = dms_to_decimal("51deg 30' 26.4\"").unwrap();
        assert!((v - (51.0 + 30.0 / 60.0 + 26.4 / 3600.0)).abs() < 1e-12);

        let neg = dms_to_decimal("-12deg 05' 06.7\"").unwrap();
        assert!((neg + (12.0 + 5.0 / 60.0 + 6.7 / 3600.0)).abs() < 1e-12);
    }

    #[test]
    fn test_dms_to_decimal_plain_and_partial() {
        assert_eq!(dms_to_decimal(" -33.25 ").unwrap(), -33.25);
        assert_eq!(dms_to_decimal("12deg").unwrap(), 12.0);
        assert!((dms_to_decimal("12deg 30'").unwrap() - 12.5).abs() < 1e-12);
    }

    #[test]
    fn test_dms_to_decimal_rejects_garbage() {
        assert!(dms_to_decimal("").is_err());
        assert!(dms_to_decimal("north").is_err());
        assert!(dms_to_decimal("12deg 75' 00.0\"").is_err());
        assert!(dms_to_decimal("12deg 10' 00.0\" extra").is_err());
    }

    #[test]
    fn test_format_then_parse_within_tenth_arcsecond() {
        for &deg in &[-51.64, -0.5, 0.0001, 33.3333, 179.99] {
            let back = dms_to_decimal(&format_dms(deg)).unwrap();
            assert!((back - deg).abs() <= 0.05 / 3600.0 + 1e-12);
        }
    }
}
