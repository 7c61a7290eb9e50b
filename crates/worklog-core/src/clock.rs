use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

/// Fixed-width UTC timestamp: `YYYY-MM-DDThh:mm:ss.mmmZ`.
///
/// Every field is zero-padded, so lexicographic comparison of two
/// timestamps is equivalent to chronological comparison. All ordering
/// logic in the reducers relies on this.
const TS_FORMAT: &[FormatItem<'_>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

const DAY_FORMAT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

pub fn now_ts() -> String {
    format_ts(OffsetDateTime::now_utc())
}

pub fn format_ts(t: OffsetDateTime) -> String {
    t.format(&TS_FORMAT)
        .expect("timestamp formatting should not fail")
}

/// Calendar-date key for the current UTC day.
pub fn today() -> String {
    OffsetDateTime::now_utc()
        .format(&DAY_FORMAT)
        .expect("day formatting should not fail")
}

/// Day component of a timestamp string (`YYYY-MM-DD` prefix).
pub fn day_of(ts: &str) -> &str {
    &ts[..ts.len().min(10)]
}

/// Parse a log timestamp back into an instant. Fails on anything that
/// `format_ts` would not have produced.
pub fn parse_ts(ts: &str) -> Result<OffsetDateTime, time::error::Parse> {
    time::PrimitiveDateTime::parse(ts, &TS_FORMAT).map(|t| t.assume_utc())
}

/// Whole minutes between two log timestamps, clamped at zero.
pub fn minutes_between(start: &str, end: &str) -> Option<u64> {
    let start = parse_ts(start).ok()?;
    let end = parse_ts(end).ok()?;
    let minutes = (end - start).whole_minutes();
    Some(minutes.max(0) as u64)
}

/// Compact version token derived from a timestamp: `YYYYMMDDThhmmss`.
/// Pure string transform so the token stays aligned with the log's
/// string-ordered timestamps.
pub fn version_token(ts: &str) -> String {
    ts.chars()
        .take(19)
        .filter(|c| *c != '-' && *c != ':')
        .collect()
}
