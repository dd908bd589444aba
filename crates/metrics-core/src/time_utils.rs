use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// The timezone session dates are bucketed in.
///
/// Events are stored in UTC but a session belongs to the Pacific-time calendar
/// date of its first event. This is a product rule, not a display preference,
/// so it is fixed rather than detected from the host system.
pub const REPORT_TZ: Tz = chrono_tz::US::Pacific;

// ── Calendar conversion ───────────────────────────────────────────────────────

/// The Pacific-time calendar date a UTC timestamp falls on.
pub fn pacific_date(ts: DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(&REPORT_TZ).date_naive()
}

/// Midnight at the start of `date` in Pacific time, as a UTC instant.
///
/// Used as the exclusive upper bound of the report window. DST transitions in
/// the Pacific zone happen at 02:00 local, so midnight is never skipped; the
/// ambiguous-fall-back arm picks the earlier instant and the impossible arm
/// only exists to keep the function total.
pub fn pacific_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match REPORT_TZ.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(first, _) => first.with_timezone(&Utc),
        LocalResult::None => {
            warn!("pacific_midnight: {} has no local midnight, assuming PST", date);
            Utc.from_utc_datetime(&(naive + chrono::TimeDelta::hours(8)))
        }
    }
}

/// Today's date on the Pacific calendar.
pub fn today_pacific() -> NaiveDate {
    pacific_date(Utc::now())
}

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Parse a timestamp string from an event record into a UTC [`DateTime`].
///
/// Handles RFC 3339 (including the `Z` suffix) and the naive
/// `"%Y-%m-%d %H:%M:%S"` shapes document-store exports produce; naive values
/// are interpreted as UTC, matching how the backend stores `created_at`.
/// Returns `None` for empty or unrecognised strings.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    // Replace trailing 'Z' with '+00:00' for RFC 3339 compatibility.
    let normalised = if let Some(stripped) = s.strip_suffix('Z') {
        format!("{}+00:00", stripped)
    } else {
        s.to_string()
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
        return Some(dt.with_timezone(&Utc));
    }

    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in FORMATS {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    warn!("parse_timestamp: could not parse \"{}\"", s);
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── pacific_date ──────────────────────────────────────────────────────────

    #[test]
    fn test_pacific_date_midday_utc_same_date() {
        let ts = Utc.with_ymd_and_hms(2022, 3, 1, 20, 0, 0).unwrap();
        // 20:00 UTC = 12:00 PST, still March 1st.
        assert_eq!(pacific_date(ts), date(2022, 3, 1));
    }

    #[test]
    fn test_pacific_date_early_utc_is_previous_date() {
        let ts = Utc.with_ymd_and_hms(2022, 3, 2, 5, 0, 0).unwrap();
        // 05:00 UTC on March 2nd = 21:00 PST on March 1st.
        assert_eq!(pacific_date(ts), date(2022, 3, 1));
    }

    #[test]
    fn test_pacific_date_respects_dst_offset() {
        // July: PDT is UTC-7, so 06:30 UTC is 23:30 the previous day.
        let ts = Utc.with_ymd_and_hms(2022, 7, 2, 6, 30, 0).unwrap();
        assert_eq!(pacific_date(ts), date(2022, 7, 1));
        // 07:30 UTC is 00:30 the same day.
        let ts = Utc.with_ymd_and_hms(2022, 7, 2, 7, 30, 0).unwrap();
        assert_eq!(pacific_date(ts), date(2022, 7, 2));
    }

    // ── pacific_midnight ──────────────────────────────────────────────────────

    #[test]
    fn test_pacific_midnight_standard_time() {
        // March 1st: PST (UTC-8), midnight local = 08:00 UTC.
        let utc = pacific_midnight(date(2022, 3, 1));
        assert_eq!(utc, Utc.with_ymd_and_hms(2022, 3, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_pacific_midnight_daylight_time() {
        // July 1st: PDT (UTC-7), midnight local = 07:00 UTC.
        let utc = pacific_midnight(date(2022, 7, 1));
        assert_eq!(utc, Utc.with_ymd_and_hms(2022, 7, 1, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_pacific_midnight_on_dst_transition_days() {
        // Spring-forward (2022-03-13) and fall-back (2022-11-06) both move the
        // clock at 02:00 local; midnight itself resolves normally.
        let spring = pacific_midnight(date(2022, 3, 13));
        assert_eq!(spring, Utc.with_ymd_and_hms(2022, 3, 13, 8, 0, 0).unwrap());
        let fall = pacific_midnight(date(2022, 11, 6));
        assert_eq!(fall, Utc.with_ymd_and_hms(2022, 11, 6, 7, 0, 0).unwrap());
    }

    // ── today_pacific ─────────────────────────────────────────────────────────

    #[test]
    fn test_today_pacific_matches_manual_conversion() {
        assert_eq!(today_pacific(), pacific_date(Utc::now()));
    }

    // ── parse_timestamp ───────────────────────────────────────────────────────

    #[test]
    fn test_parse_timestamp_z_suffix() {
        let dt = parse_timestamp("2022-03-01T10:30:00Z").unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        let dt = parse_timestamp("2022-03-01T12:00:00+02:00").unwrap();
        // 12:00 +02:00 = 10:00 UTC.
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_timestamp_naive_is_utc() {
        let dt = parse_timestamp("2022-03-01 10:30:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2022, 3, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_fractional_seconds() {
        let dt = parse_timestamp("2022-03-01T10:30:00.250Z").unwrap();
        assert_eq!(dt.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_timestamp_empty_returns_none() {
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_parse_timestamp_garbage_returns_none() {
        assert!(parse_timestamp("not-a-date").is_none());
    }
}
