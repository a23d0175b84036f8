//! Heuristic normalization of server-rendered relative date text.
//!
//! The member pages render when a medal was earned as relative or partial
//! text ("at 3:15 PM", "yesterday, 9:02 AM", "on Saturday, 11:00 PM",
//! "on Dec 31 2023, 11:59 PM", "on Dec 31, 11:59 PM"). This module converts
//! that text into an absolute [`NaiveDateTime`] anchored on an explicit
//! `now`, so the heuristic is deterministic and testable.
//!
//! # Grammar dispatch
//!
//! Input is whitespace-canonicalized, then classified into exactly one of
//! five grammars, tried in a fixed priority order with first-match-wins
//! semantics. There is no backtracking: if a grammar's shape matches but a
//! token inside it fails to parse (a bogus weekday name, an impossible
//! calendar day), the whole text is unparseable rather than falling through
//! to a later grammar.
//!
//! # Year-less dates
//!
//! The `on <Month> <Day>` grammar carries no year, so the year defaults to
//! `now`'s year. A December medal viewed in January is therefore attributed
//! to the current year. This matches the historic archive contents and is
//! kept deliberately; no future-date-implies-prior-year correction is
//! applied.

use chrono::{Datelike, Days, Month, NaiveDateTime, NaiveTime, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

/// Failure to normalize a date string; carries the original text so the
/// caller can preserve it verbatim in the record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized date text: {original:?}")]
pub struct UnparsedDate {
    /// The input text, untouched.
    pub original: String,
}

static AT_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^at (\d{1,2}:\d{2} (?i:[AP]M))$").unwrap());
static YESTERDAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^yesterday, (\d{1,2}:\d{2} (?i:[AP]M))$").unwrap());
static ON_WEEKDAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^on ([A-Za-z]+), (\d{1,2}:\d{2} (?i:[AP]M))$").unwrap());
static ON_MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^on ([A-Za-z]+) (\d{1,2}) (\d{4}), (\d{1,2}:\d{2} (?i:[AP]M))$").unwrap()
});
static ON_MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^on ([A-Za-z]+) (\d{1,2}), (\d{1,2}:\d{2} (?i:[AP]M))$").unwrap()
});

/// The five recognized date grammars, in priority order.
#[derive(Debug, PartialEq, Eq)]
enum DateGrammar {
    /// `at <H:MM AM/PM>` — earned today.
    AtTime { clock: String },
    /// `yesterday, <H:MM AM/PM>` — earned one calendar day ago.
    Yesterday { clock: String },
    /// `on <Weekday>, <H:MM AM/PM>` — the most recent prior occurrence of
    /// that weekday, strictly before today.
    OnWeekday { weekday: String, clock: String },
    /// `on <Month> <Day> <Year>, <H:MM AM/PM>` — fully absolute.
    OnMonthDayYear {
        month: String,
        day: String,
        year: String,
        clock: String,
    },
    /// `on <Month> <Day>, <H:MM AM/PM>` — year taken from `now`.
    OnMonthDay {
        month: String,
        day: String,
        clock: String,
    },
}

/// Collapse whitespace runs (non-breaking spaces included) to single ASCII
/// spaces and trim the ends.
fn canonicalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify canonical text into exactly one grammar. First match wins.
fn classify(canon: &str) -> Option<DateGrammar> {
    if let Some(c) = AT_TIME.captures(canon) {
        return Some(DateGrammar::AtTime {
            clock: c[1].to_string(),
        });
    }
    if let Some(c) = YESTERDAY.captures(canon) {
        return Some(DateGrammar::Yesterday {
            clock: c[1].to_string(),
        });
    }
    if let Some(c) = ON_WEEKDAY.captures(canon) {
        return Some(DateGrammar::OnWeekday {
            weekday: c[1].to_string(),
            clock: c[2].to_string(),
        });
    }
    if let Some(c) = ON_MONTH_DAY_YEAR.captures(canon) {
        return Some(DateGrammar::OnMonthDayYear {
            month: c[1].to_string(),
            day: c[2].to_string(),
            year: c[3].to_string(),
            clock: c[4].to_string(),
        });
    }
    if let Some(c) = ON_MONTH_DAY.captures(canon) {
        return Some(DateGrammar::OnMonthDay {
            month: c[1].to_string(),
            day: c[2].to_string(),
            clock: c[3].to_string(),
        });
    }
    None
}

fn parse_clock(clock: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(clock, "%I:%M %p").ok()
}

fn month_number(name: &str) -> Option<u32> {
    Month::from_str(name).ok().map(|m| m.number_from_month())
}

/// Normalize relative/partial date text into an absolute timestamp.
///
/// `now` anchors every relative grammar. On any failure — unrecognized
/// shape, bad weekday or month name, impossible calendar day, out-of-range
/// clock — the returned [`UnparsedDate`] carries `text` unchanged so the
/// caller can fall back to it as the record's date field.
pub fn normalize(text: &str, now: NaiveDateTime) -> Result<NaiveDateTime, UnparsedDate> {
    let unparsed = || UnparsedDate {
        original: text.to_string(),
    };
    let canon = canonicalize(text);
    let grammar = classify(&canon).ok_or_else(unparsed)?;

    match grammar {
        DateGrammar::AtTime { clock } => {
            let time = parse_clock(&clock).ok_or_else(unparsed)?;
            Ok(now.date().and_time(time))
        }
        DateGrammar::Yesterday { clock } => {
            let time = parse_clock(&clock).ok_or_else(unparsed)?;
            let date = now
                .date()
                .checked_sub_days(Days::new(1))
                .ok_or_else(unparsed)?;
            Ok(date.and_time(time))
        }
        DateGrammar::OnWeekday { weekday, clock } => {
            let wanted = Weekday::from_str(&weekday).map_err(|_| unparsed())?;
            let time = parse_clock(&clock).ok_or_else(unparsed)?;
            // Walk back one day at a time, at most seven steps. "on <Weekday>"
            // always means a day within the prior week, never today.
            let mut date = now.date();
            for _ in 0..7 {
                date = date.checked_sub_days(Days::new(1)).ok_or_else(unparsed)?;
                if date.weekday() == wanted {
                    return Ok(date.and_time(time));
                }
            }
            Err(unparsed())
        }
        DateGrammar::OnMonthDayYear {
            month,
            day,
            year,
            clock,
        } => {
            let time = parse_clock(&clock).ok_or_else(unparsed)?;
            let month = month_number(&month).ok_or_else(unparsed)?;
            let day: u32 = day.parse().map_err(|_| unparsed())?;
            let year: i32 = year.parse().map_err(|_| unparsed())?;
            let date = chrono::NaiveDate::from_ymd_opt(year, month, day).ok_or_else(unparsed)?;
            Ok(date.and_time(time))
        }
        DateGrammar::OnMonthDay { month, day, clock } => {
            let time = parse_clock(&clock).ok_or_else(unparsed)?;
            let month = month_number(&month).ok_or_else(unparsed)?;
            let day: u32 = day.parse().map_err(|_| unparsed())?;
            // Year-less dates always take now's year, even when that lands
            // in the future relative to now.
            let date =
                chrono::NaiveDate::from_ymd_opt(now.year(), month, day).ok_or_else(unparsed)?;
            Ok(date.and_time(time))
        }
    }
}

/// Render a normalized timestamp the way the archive stores it.
pub fn to_archive_string(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}
