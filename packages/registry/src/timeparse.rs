use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

// Naive datetime shapes seen in upstream text, day-first variants before
// month-first. The first two are the CTFtime feed and event-page formats.
const DATETIME_FORMATS: &[&str] = &[
    "%a, %d %B %Y, %H:%M",
    "%d %B %Y, %H:%M",
    "%B %d, %Y, %I %p",
    "%B %d, %Y, %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%d %B %Y",
    "%B %d, %Y",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
];

/// Best-effort conversion of externally-sourced date text into an instant.
///
/// Accepts unix timestamps, RFC 3339/2822, and a ladder of loose textual
/// shapes. Values without zone information are anchored in `tz`; zoned values
/// are converted. Returns `None` for anything unparseable (including the
/// "à venir" sentinel) — callers exclude those from time-based ordering.
pub fn parse_instant(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let text = normalize_meridiem(raw.trim());
    if text.is_empty() {
        return None;
    }

    // Numeric input is a unix timestamp in seconds.
    if let Ok(ts) = text.parse::<i64>() {
        return DateTime::from_timestamp(ts, 0);
    }
    if let Ok(ts) = text.parse::<f64>() {
        return DateTime::from_timestamp_millis((ts * 1000.0) as i64);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&text) {
        return Some(dt.with_timezone(&Utc));
    }

    // The feed spells zones as a trailing name chrono cannot parse; only UTC
    // is ever emitted ("04 July 2025, 17:00 UTC").
    for suffix in [" UTC", " GMT"] {
        if let Some(stripped) = text.strip_suffix(suffix) {
            if let Some(naive) = parse_naive(stripped.trim_end_matches(',').trim()) {
                return Some(naive.and_utc());
            }
        }
    }

    parse_naive(&text).and_then(|naive| anchor(naive, tz))
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Anchor a naive datetime in the community timezone. DST gaps resolve to the
/// earliest valid instant.
fn anchor(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Normalize locale AM/PM spellings ("a.m.", "P.M.") so `%p` can match.
fn normalize_meridiem(text: &str) -> String {
    text.replace("a.m.", "AM")
        .replace("A.M.", "AM")
        .replace("p.m.", "PM")
        .replace("P.M.", "PM")
}
