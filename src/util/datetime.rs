use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

use super::ExtractError;

static ORDINAL_REGEX: OnceLock<Regex> = OnceLock::new();
static TRAILING_UT_REGEX: OnceLock<Regex> = OnceLock::new();

fn ordinal_regex() -> &'static Regex {
    ORDINAL_REGEX
        .get_or_init(|| Regex::new(r"(\d+)(?:st|nd|rd|th)").expect("ordinal pattern is valid"))
}

fn trailing_ut_regex() -> &'static Regex {
    TRAILING_UT_REGEX
        .get_or_init(|| Regex::new(r"(\s)UT$").expect("trailing UT pattern is valid"))
}

/// Date formats recognized in feeds, in the order they are attempted.
///
/// Order matters: the numeric-zone form must win over the named-zone form, and
/// the long form is the most permissive so it goes last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DateFormat {
    /// `Mon, 02 Jan 2006 15:04:05 -0700`
    Rfc1123Z,
    /// `Mon, 02 Jan 2006 15:04:05 MST`
    Rfc1123,
    /// `2006-01-02T15:04:05Z07:00`
    Rfc3339,
    /// `Monday, January 02, 2006 15:04:05 MST`
    LongForm,
}

impl DateFormat {
    pub const PRIORITY: [DateFormat; 4] = [
        DateFormat::Rfc1123Z,
        DateFormat::Rfc1123,
        DateFormat::Rfc3339,
        DateFormat::LongForm,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DateFormat::Rfc1123Z => "RFC1123Z",
            DateFormat::Rfc1123 => "RFC1123",
            DateFormat::Rfc3339 => "RFC3339",
            DateFormat::LongForm => "LongForm",
        }
    }

    /// Reference layout, useful in error messages and debug output.
    pub fn layout(&self) -> &'static str {
        match self {
            DateFormat::Rfc1123Z => "Mon, 02 Jan 2006 15:04:05 -0700",
            DateFormat::Rfc1123 => "Mon, 02 Jan 2006 15:04:05 MST",
            DateFormat::Rfc3339 => "2006-01-02T15:04:05Z07:00",
            DateFormat::LongForm => "Monday, January 02, 2006 15:04:05 MST",
        }
    }

    fn parse(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        match self {
            DateFormat::Rfc1123Z => {
                DateTime::parse_from_str(strip_weekday(text), "%d %b %Y %H:%M:%S %z").ok()
            }
            DateFormat::Rfc1123 => parse_named_zone(strip_weekday(text), "%d %b %Y %H:%M:%S"),
            DateFormat::Rfc3339 => DateTime::parse_from_rfc3339(text).ok(),
            DateFormat::LongForm => parse_named_zone(strip_weekday(text), "%B %d, %Y %H:%M:%S"),
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A publication instant together with the format it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublishedDateTime {
    pub value: DateTime<FixedOffset>,
    pub format: DateFormat,
}

impl PublishedDateTime {
    pub fn to_utc(&self) -> DateTime<Utc> {
        self.value.with_timezone(&Utc)
    }
}

/// Parses a loosely formatted feed date.
///
/// Ordinal day suffixes (`1st`, `22nd`) are stripped and a trailing bare `UT`
/// zone is rewritten to `UTC` before the formats in [`DateFormat::PRIORITY`]
/// are tried. The leading weekday name is never cross-checked against the date.
///
/// # Errors
///
/// Returns [`ExtractError::DateTimeParseFailed`] if no format matches.
pub fn parse_datetime(text: &str) -> Result<PublishedDateTime, ExtractError> {
    let normalized = normalize(text);

    DateFormat::PRIORITY
        .iter()
        .find_map(|format| {
            format.parse(&normalized).map(|value| PublishedDateTime {
                value,
                format: *format,
            })
        })
        .ok_or_else(|| ExtractError::DateTimeParseFailed(text.to_string()))
}

fn normalize(text: &str) -> String {
    let without_ordinals = ordinal_regex().replace_all(text.trim(), "$1");
    trailing_ut_regex()
        .replace(&without_ordinals, "${1}UTC")
        .into_owned()
}

/// Drops a leading `Weekday, ` prefix if present.
fn strip_weekday(text: &str) -> &str {
    match text.split_once(", ") {
        Some((day, rest)) if !day.is_empty() && day.chars().all(|c| c.is_ascii_alphabetic()) => {
            rest
        }
        _ => text,
    }
}

/// Parses `<datetime> <ZONE>` where ZONE is an alphabetic abbreviation.
fn parse_named_zone(text: &str, layout: &str) -> Option<DateTime<FixedOffset>> {
    let (datetime, zone) = text.rsplit_once(' ')?;
    let offset = zone_offset(zone)?;
    let naive = NaiveDateTime::parse_from_str(datetime, layout).ok()?;
    offset.from_local_datetime(&naive).single()
}

/// Resolves a zone abbreviation. Unknown alphabetic abbreviations map to UTC.
fn zone_offset(zone: &str) -> Option<FixedOffset> {
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let hours = match zone.to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "UT" | "Z" | "WET" => 0,
        "BST" | "CET" | "WEST" => 1,
        "CEST" | "EET" => 2,
        "EEST" | "MSK" => 3,
        "IST" => return FixedOffset::east_opt(5 * 3600 + 1800),
        "JST" | "KST" => 9,
        "AEST" => 10,
        "EST" => -5,
        "EDT" | "AST" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        other => {
            tracing::debug!(zone = %other, "Unknown time zone abbreviation, assuming UTC");
            0
        }
    };

    FixedOffset::east_opt(hours * 3600)
}
