//! Storage formatting for instants.
//!
//! All timestamps are persisted as RFC 3339 UTC with whole seconds and a `Z`
//! suffix, which keeps lexicographic and chronological order identical for
//! range queries on TEXT columns.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format an instant for storage.
pub fn to_storage(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored instant. Returns `None` for anything that is not RFC 3339.
pub fn parse_storage(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}
