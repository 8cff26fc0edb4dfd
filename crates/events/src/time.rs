//! `recorded_on` timestamp codec.
//!
//! Sources disagree on how they render timestamps: the canonical form is ISO-8601,
//! direct SQL reads produce `2025-10-25 20:55:11.880809`, and Postgres text output
//! produces `2025-10-25 21:23:50+00` (or `+02`, `-05` outside UTC sessions).
//! Formats are tried in exactly that order.
//! Instants are kept at millisecond precision and always written back as ISO-8601
//! UTC with a `Z` suffix.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use strata_codec::{Schema, decoder, schema};

pub fn utc() -> Schema<DateTime<Utc>> {
    schema::string().then(
        |s| match parse_utc(&s) {
            Some(instant) => decoder::succeed(instant),
            None => decoder::fail(format!(
                "Invalid date format: {s} (expected ISO, SQL, or Postgres format)"
            )),
        },
        format_utc,
    )
}

pub fn format_utc(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse any of the accepted forms, normalised to UTC milliseconds.
pub fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    parse_iso(s)
        .or_else(|| parse_sql(s))
        .or_else(|| parse_postgres(s))
        .map(|instant| instant.trunc_subsecs(3))
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Some(instant.with_timezone(&Utc));
    }
    // Minute precision with a zone: `2025-10-25T20:55Z`, `2025-10-25T22:55+02:00`.
    let minutes_utc = s
        .strip_suffix('Z')
        .and_then(|rest| NaiveDateTime::parse_from_str(rest, "%Y-%m-%dT%H:%M").ok());
    if let Some(naive) = minutes_utc {
        return Some(naive.and_utc());
    }
    if let Ok(instant) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%#z") {
        return Some(instant.with_timezone(&Utc));
    }
    // Zone-less ISO strings are read as UTC.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_sql(s: &str) -> Option<DateTime<Utc>> {
    // Offsets may be spaced or attached, with or without minutes: ` +00:00`, `+02`, `-0530`.
    for format in ["%Y-%m-%d %H:%M:%S%.f %:z", "%Y-%m-%d %H:%M:%S%.f%#z"] {
        if let Ok(instant) = DateTime::parse_from_str(s, format) {
            return Some(instant.with_timezone(&Utc));
        }
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_postgres(s: &str) -> Option<DateTime<Utc>> {
    parse_iso(&s.replacen("+00", "Z", 1).replacen(' ', "T", 1))
}
