use chrono::{DateTime, SecondsFormat, Utc};

/// Converts a `Date:` header (RFC 2822) to an RFC 3339 UTC timestamp.
/// Unparseable headers are stamped with `now` so the record still sorts sensibly.
pub fn header_to_utc(date_header: &str, now: DateTime<Utc>) -> String {
    let received = DateTime::parse_from_rfc2822(date_header.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);
    received.to_rfc3339_opts(SecondsFormat::Secs, false)
}
