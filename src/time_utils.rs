// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Human-readable absolute date string for push notifications,
/// e.g. "Jan 5, 2026 6:00 PM UTC".
pub fn format_absolute(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y %-I:%M %p UTC").to_string()
}

/// Short date used inside tweet bodies, e.g. "Jan 5".
pub fn format_short_date(date: DateTime<Utc>) -> String {
    date.format("%b %-d").to_string()
}

/// Discord dynamic timestamp markup; renders in each reader's local zone.
pub fn discord_timestamp(date: DateTime<Utc>) -> String {
    format!("<t:{}:f>", date.timestamp())
}
