// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
///
/// Millisecond precision keeps lexicographic order equal to time order,
/// which the newest-first sorts rely on.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time as a stored timestamp string.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Timestamp for the next message of a thread whose newest message was
/// stamped `previous`.
///
/// Strictly later than `previous` (by at least a millisecond), so messages
/// written back to back still sort in write order.
pub fn next_message_timestamp(previous: Option<&str>) -> String {
    let now = Utc::now();
    let floor = previous
        .and_then(|p| DateTime::parse_from_rfc3339(p).ok())
        .map(|p| p.with_timezone(&Utc) + TimeDelta::milliseconds(1));

    match floor {
        Some(floor) if floor > now => format_utc_rfc3339(floor),
        _ => format_utc_rfc3339(now),
    }
}
