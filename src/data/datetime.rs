use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Resolve an IANA timezone name such as `America/Chicago`, falling back to UTC
/// when the name is missing or unknown.
pub fn parse_timezone(name: Option<&str>) -> Tz {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Tz::UTC;
    };
    name.parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!("unknown timezone {name:?}; showing times in UTC");
        Tz::UTC
    })
}

/// Format an instrument timestamp (Unix seconds) for display.
///
/// With `human` set, shows the date and time in `tz`, adding milliseconds when
/// the timestamp has a fractional part. Non-positive or out-of-range values
/// fall back to plain seconds.
pub fn format_timestamp(ts: f64, human: bool, tz: Tz) -> String {
    if !human || !ts.is_finite() || ts <= 0.0 {
        return format!("{ts:.3}");
    }
    let secs = ts.floor() as i64;
    let nanos = ((ts - ts.floor()) * 1_000_000_000.0) as u32;
    match DateTime::<Utc>::from_timestamp(secs, nanos).map(|dt| dt.with_timezone(&tz)) {
        Some(dt) if nanos == 0 => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        None => format!("{ts:.3}"),
    }
}

/// Format a duration in seconds as `1h 02m 03s`, `2m 03s` or `3.0s`.
pub fn format_duration(secs: f64) -> String {
    if !secs.is_finite() || secs < 60.0 {
        return format!("{secs:.1}s");
    }
    let total = secs.round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else {
        format!("{m}m {s:02}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_and_raw_timestamps() {
        assert_eq!(format_timestamp(1_749_600_000.0, true, Tz::UTC), "2025-06-11 00:00:00");
        assert_eq!(format_timestamp(1_749_600_000.5, true, Tz::UTC), "2025-06-11 00:00:00.500");
        assert_eq!(format_timestamp(12.0, false, Tz::UTC), "12.000");
        assert_eq!(format_timestamp(-1.0, true, Tz::UTC), "-1.000");
    }

    #[test]
    fn local_time_follows_export_timezone() {
        let chicago = parse_timezone(Some("America/Chicago"));
        assert_eq!(chicago, Tz::America__Chicago);
        // Daylight time in June: UTC-5.
        assert_eq!(format_timestamp(1_749_600_000.0, true, chicago), "2025-06-10 19:00:00");
        // Standard time in January: UTC-6.
        assert_eq!(format_timestamp(1_736_899_200.0, true, chicago), "2025-01-14 18:00:00");
    }

    #[test]
    fn unknown_timezone_is_utc() {
        assert_eq!(parse_timezone(Some("Mars/Olympus")), Tz::UTC);
        assert_eq!(parse_timezone(Some("  ")), Tz::UTC);
        assert_eq!(parse_timezone(None), Tz::UTC);
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(3.0), "3.0s");
        assert_eq!(format_duration(123.0), "2m 03s");
        assert_eq!(format_duration(3723.0), "1h 02m 03s");
    }
}
