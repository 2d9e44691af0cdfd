//! ISO-8601 rendering and parsing for request parameters and quota headers.

use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

/// Renders a timestamp in UTC with second precision, e.g. `2024-01-01T00:00:00Z`.
///
/// Returns `None` for values outside the four-digit year range.
pub fn format_iso8601(value: OffsetDateTime) -> Option<String> {
    let utc = value.to_offset(UtcOffset::UTC);
    let truncated = utc.replace_nanosecond(0).unwrap_or(utc);
    truncated.format(&Rfc3339).ok()
}

/// Parses an RFC3339 timestamp such as `2013-07-31T19:00:00.000Z`, normalized to UTC.
pub fn parse_iso8601(input: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(input.trim(), &Rfc3339)
        .ok()
        .map(|value| value.to_offset(UtcOffset::UTC))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_utc_without_fraction() {
        let ts = datetime!(2024-01-01 00:00:00.750 UTC);
        assert_eq!(format_iso8601(ts).as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn converts_offsets_to_utc() {
        let ts = datetime!(2017-04-07 12:00:00 -07:00);
        assert_eq!(format_iso8601(ts).as_deref(), Some("2017-04-07T19:00:00Z"));
    }

    #[test]
    fn parses_quota_reset_header() {
        let parsed = parse_iso8601("2013-07-31T19:00:00.000Z").expect("must parse");
        assert_eq!(parsed, datetime!(2013-07-31 19:00:00 UTC));
        assert!(parse_iso8601("yesterday").is_none());
    }
}
