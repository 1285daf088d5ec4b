// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.
//!
//! "Local calendar day" always means the day as perceived in the user's
//! IANA timezone, not in UTC. Records without a usable timezone fall back
//! to UTC.

use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc};
use chrono_tz::Tz;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Resolve an optional IANA timezone name, falling back to UTC.
///
/// The mobile client historically stored `""` for an unset timezone, so
/// empty strings are treated as absent rather than invalid.
pub fn resolve_tz(timezone: Option<&str>) -> Tz {
    match timezone {
        Some(name) if !name.is_empty() => name.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!(timezone = name, "Invalid timezone, falling back to UTC");
            Tz::UTC
        }),
        _ => Tz::UTC,
    }
}

/// Whether two instants fall on the same calendar day in `tz`.
pub fn same_local_day(a: DateTime<Utc>, b: DateTime<Utc>, tz: Tz) -> bool {
    a.with_timezone(&tz).date_naive() == b.with_timezone(&tz).date_naive()
}

/// Whether `earlier` falls on the calendar day immediately before `now` in `tz`.
pub fn is_local_yesterday(earlier: DateTime<Utc>, now: DateTime<Utc>, tz: Tz) -> bool {
    let gap = now.with_timezone(&tz).date_naive() - earlier.with_timezone(&tz).date_naive();
    gap.num_days() == 1
}

/// The hour of day (0-23) at `now` in `tz`.
pub fn local_hour(now: DateTime<Utc>, tz: Tz) -> u32 {
    now.with_timezone(&tz).hour()
}

/// Calendar-day key (`YYYY-MM-DD`) for `now` in `tz`.
///
/// Used as the per-(user, day) idempotency key for the midnight scanner.
pub fn local_date_key(now: DateTime<Utc>, tz: Tz) -> String {
    let local = now.with_timezone(&tz);
    format!(
        "{:04}-{:02}-{:02}",
        local.year(),
        local.month(),
        local.day()
    )
}
