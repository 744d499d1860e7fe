use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::config::DateSource;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%m-%d-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%y %H:%M",
    "%m/%d/%y %I:%M %p",
];

// Spreadsheet serial days count from 1899-12-30 (1900 date system).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
const SERIAL_MIN: f64 = 18_264.0; // 1950-01-01
const SERIAL_MAX: f64 = 2_958_465.0; // 9999-12-31
const YEAR_MIN: i32 = 1900;

/// Outcome of resolving a record's effective date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Submission(NaiveDate),
    Fallback(NaiveDate),
    Unresolved,
}

impl Resolved {
    pub fn date(self) -> Option<NaiveDate> {
        match self {
            Resolved::Submission(d) | Resolved::Fallback(d) => Some(d),
            Resolved::Unresolved => None,
        }
    }

    pub fn source(self) -> DateSource {
        match self {
            Resolved::Submission(_) => DateSource::Submission,
            Resolved::Fallback(_) => DateSource::Fallback,
            Resolved::Unresolved => DateSource::Unresolved,
        }
    }
}

/// Picks the submission date when it parses, otherwise the fallback date.
pub fn resolve(submission: Option<&str>, fallback: Option<&str>) -> Resolved {
    if let Some(date) = submission.and_then(parse_date) {
        return Resolved::Submission(date);
    }
    match fallback.and_then(parse_date) {
        Some(date) => Resolved::Fallback(date),
        None => Resolved::Unresolved,
    }
}

/// `YYYY-MM` bucket of a date.
pub fn month_bucket(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Permissive date parser. Datetimes are truncated to their calendar date.
/// Returns `None` for anything it does not recognise.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            if plausible(dt.date()) {
                return Some(dt.date());
            }
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            if plausible(d) {
                return Some(d);
            }
        }
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        match s.len() {
            4 => return parse_year(s),
            8 => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y%m%d") {
                    return Some(d);
                }
            }
            _ => {}
        }
    }

    parse_serial(s)
}

// `%Y` happily reads "24" as year 24; such matches are left for `%y`.
fn plausible(date: NaiveDate) -> bool {
    date.year() >= 1000
}

// A bare four-digit year means January 1st of that year.
fn parse_year(s: &str) -> Option<NaiveDate> {
    let year: i32 = s.parse().ok()?;
    if year < YEAR_MIN {
        return None;
    }
    NaiveDate::from_ymd_opt(year, 1, 1)
}

// Small numbers are junk, not day counts; only serials from 1950 on are taken.
fn parse_serial(s: &str) -> Option<NaiveDate> {
    let value: f64 = s.parse().ok()?;
    if !value.is_finite() || !(SERIAL_MIN..=SERIAL_MAX).contains(&value) {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_signed(Duration::days(value.trunc() as i64))
}
