use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::MembershipError;

/// UTC timestamp as RFC3339 with `Z`, the storage format for every
/// date column.
pub fn to_iso8601_utc_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_iso8601_string(s: &str) -> crate::error::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MembershipError::TimeParse(e.to_string()))
}
