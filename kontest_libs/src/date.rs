use chrono::{
    DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

type Result<T> = std::result::Result<T, DateParseError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateParseError {
    #[error("`{0}` matches none of the known date formats")]
    UnknownFormatError(String),
}

/// `yyyy-MM-dd'T'HH:mm:ss.SSSZ`, e.g. `2024-07-30T18:30:00.000Z`
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";
/// `yyyy-MM-dd HH:mm:ss zzz` without the trailing zone name, e.g. `2022-10-10 06:30:00 UTC`
const ZONED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const LISTING_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub const INVALID_DURATION: &str = "Invalid Duration";
/// Listings running longer than this are dropped as unreasonable.
pub const MAX_DURATION_HOURS: i64 = 360;

static GMT_OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:GMT|UTC)([+-])(\d{1,2})(?::?(\d{2}))?$").unwrap());

/// Parse a contest timestamp.
///
/// The ISO form is tried first and the zone-abbreviated form second; the first match wins.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    parse_iso(s).or_else(|| parse_zoned(s))
}

pub fn try_parse_date(s: &str) -> Result<DateTime<Utc>> {
    parse_date(s).ok_or_else(|| DateParseError::UnknownFormatError(s.to_string()))
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    let normalized = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(stripped) => format!("{}+0000", stripped),
        None => s.to_string(),
    };

    DateTime::parse_from_str(&normalized, ISO_FORMAT)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

fn parse_zoned(s: &str) -> Option<DateTime<Utc>> {
    let (local, zone) = s.rsplit_once(' ')?;
    let offset = zone_offset(zone)?;
    let naive = NaiveDateTime::parse_from_str(local, ZONED_FORMAT).ok()?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|date| date.with_timezone(&Utc))
}

fn zone_offset(zone: &str) -> Option<FixedOffset> {
    let hours = |h: i32| FixedOffset::east_opt(h * 3600);

    match zone.to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "UT" | "Z" => hours(0),
        "BST" | "CET" => hours(1),
        "CEST" | "EET" => hours(2),
        "MSK" | "EEST" => hours(3),
        "IST" => FixedOffset::east_opt(5 * 3600 + 30 * 60),
        "JST" | "KST" => hours(9),
        "EST" | "CDT" => hours(-5),
        "EDT" => hours(-4),
        "CST" => hours(-6),
        "MST" => hours(-7),
        "MDT" => hours(-6),
        "PST" => hours(-8),
        "PDT" => hours(-7),
        other => {
            let caps = GMT_OFFSET.captures(other)?;
            let sign = if &caps[1] == "-" { -1 } else { 1 };
            let h: i32 = caps[2].parse().ok()?;
            let m: i32 = caps.get(3).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
            FixedOffset::east_opt(sign * (h * 3600 + m * 60))
        }
    }
}

/// Render an instant the way listing sources report it.
pub fn to_listing_format(instant: &DateTime<Utc>) -> String {
    instant.format(LISTING_FORMAT).to_string()
}

/// Start and end of a span given in epoch seconds. `None` when either falls outside the
/// representable range.
pub fn epoch_span(
    start_epoch: i64,
    duration_secs: i64,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let end_epoch = start_epoch.checked_add(duration_secs)?;
    let start = Utc.timestamp_opt(start_epoch, 0).single()?;
    let end = Utc.timestamp_opt(end_epoch, 0).single()?;
    Some((start, end))
}

pub fn is_past(end: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    end <= now
}

pub fn is_future(start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now <= start
}

pub fn is_running(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    start <= now && now <= end
}

/// Midnight `days_ahead` days after the calendar day of `now`, in the zone of `now`.
///
/// A midnight repeated by a DST change resolves to its first occurrence. A midnight skipped by
/// one falls back to the current offset.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>, days_ahead: i64) -> DateTime<Utc> {
    let midnight = (now.date_naive() + Duration::days(days_ahead)).and_time(NaiveTime::MIN);
    if let Some(local) = now.timezone().from_local_datetime(&midnight).earliest() {
        return local.with_timezone(&Utc);
    }

    let offset = Duration::seconds(i64::from(now.offset().fix().local_minus_utc()));
    Utc.from_utc_datetime(&(midnight - offset))
}

pub fn tomorrow<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    start_of_day(now, 1)
}

pub fn day_after_tomorrow<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    start_of_day(now, 2)
}

/// Format a duration given in (possibly fractional) seconds as `"2h 30m"`.
///
/// Unparsable input yields [`INVALID_DURATION`]; durations over [`MAX_DURATION_HOURS`] yield
/// `None`.
pub fn format_duration(seconds: &str) -> Option<String> {
    let total = match seconds.parse::<f64>() {
        Ok(total) if total.is_finite() && total >= 0.0 => total as i64,
        _ => return Some(String::from(INVALID_DURATION)),
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    if hours > MAX_DURATION_HOURS {
        return None;
    }

    let formatted = match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    };
    Some(formatted)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_iso_format() {
        let expected = Utc.with_ymd_and_hms(2024, 7, 30, 18, 30, 0).unwrap();
        assert_eq!(parse_date("2024-07-30T18:30:00.000Z"), Some(expected));
        assert_eq!(parse_date("2024-07-31T00:00:00.000+0530"), Some(expected));
    }

    #[test]
    fn test_parse_zoned_format() {
        let expected = Utc.with_ymd_and_hms(2022, 10, 10, 6, 30, 0).unwrap();
        assert_eq!(parse_date("2022-10-10 06:30:00 UTC"), Some(expected));
        assert_eq!(parse_date("2022-10-10 15:30:00 JST"), Some(expected));
        assert_eq!(parse_date("2022-10-10 12:00:00 GMT+5:30"), Some(expected));
        assert_eq!(parse_date("2022-10-09 23:30:00 PDT"), Some(expected));
    }

    #[test]
    fn test_unparsable_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("July 30, 2024 18:30:00"), None);
        assert_eq!(parse_date("2022-10-10 06:30:00 Mars/Olympus"), None);
        assert_eq!(
            try_parse_date("tomorrow"),
            Err(DateParseError::UnknownFormatError(String::from("tomorrow")))
        );
    }

    #[test]
    fn test_listing_format_is_parsable() {
        let instant = Utc.with_ymd_and_hms(2024, 7, 30, 18, 30, 0).unwrap();
        let formatted = to_listing_format(&instant);
        assert_eq!(formatted, "2024-07-30T18:30:00.000Z");
        assert_eq!(parse_date(&formatted), Some(instant));
    }

    #[test]
    fn test_epoch_span() {
        let start = Utc.with_ymd_and_hms(2024, 8, 3, 12, 40, 0).unwrap();
        assert_eq!(
            epoch_span(1722688800, 6000),
            Some((start, start + Duration::seconds(6000)))
        );
        assert_eq!(epoch_span(i64::MAX, 1), None);
        assert_eq!(epoch_span(1722688800, i64::MAX - 1722688800), None);
    }

    #[test]
    fn test_classification_boundaries() {
        let start = Utc.with_ymd_and_hms(2024, 7, 30, 18, 30, 0).unwrap();
        let end = start + Duration::hours(2);

        assert!(is_running(start, end, start));
        assert!(is_running(start, end, end));
        assert!(!is_running(start, end, end + Duration::seconds(1)));
        assert!(is_past(end, end));
        assert!(!is_past(end, end - Duration::seconds(1)));
        assert!(is_future(start, start));
        assert!(!is_future(start, start + Duration::seconds(1)));
    }

    #[test]
    fn test_start_of_day_uses_local_offset() {
        let now = DateTime::parse_from_rfc3339("2024-07-30T23:30:00+05:30").unwrap();

        assert_eq!(
            tomorrow(&now),
            Utc.with_ymd_and_hms(2024, 7, 30, 18, 30, 0).unwrap()
        );
        assert_eq!(
            day_after_tomorrow(&now),
            Utc.with_ymd_and_hms(2024, 7, 31, 18, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration("7200"), Some(String::from("2h")));
        assert_eq!(format_duration("5400.0"), Some(String::from("1h 30m")));
        assert_eq!(format_duration("600"), Some(String::from("10m")));
        assert_eq!(format_duration("0"), Some(String::from("0m")));
        assert_eq!(format_duration(""), Some(String::from(INVALID_DURATION)));
        assert_eq!(format_duration("-60"), Some(String::from(INVALID_DURATION)));
        assert_eq!(format_duration("1296000"), Some(String::from("360h")));
        assert_eq!(format_duration("1299600"), None);
    }
}
