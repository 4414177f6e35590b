//! Absolute and relative date resolution

use crate::config::RelativeDayDefault;
use crate::models::Period;
use crate::text::contains_phrase;
use chrono::{Duration, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref ISO_DATE: Regex = Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap();
    static ref DMY_DATE: Regex = Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap();
}

/// Fixed offsets, longest phrase first.
const FIXED_OFFSETS: &[(&str, i64)] = &[
    ("day before yesterday", -2),
    ("day after tomorrow", 2),
    ("yesterday", -1),
    ("tomorrow", 1),
    ("today", 0),
    ("aaj", 0),
    ("آج", 0),
];

/// Words whose direction depends on tense ("kal" is both yesterday and tomorrow).
const AMBIGUOUS_OFFSETS: &[(&str, i64)] =
    &[("parson", 2), ("پرسوں", 2), ("kal", 1), ("کل", 1)];

const PERIODS: &[(&str, Period)] = &[
    ("this week", Period::Week),
    ("is hafte", Period::Week),
    ("weekly", Period::Week),
    ("this month", Period::Month),
    ("is mahine", Period::Month),
    ("har mahine", Period::Month),
    ("per month", Period::Month),
    ("monthly", Period::Month),
    ("this year", Period::Year),
    ("is saal", Period::Year),
    ("yearly", Period::Year),
    ("today", Period::Today),
    ("aaj", Period::Today),
];

#[derive(Debug, Clone, PartialEq)]
pub struct DateMatch {
    pub date: NaiveDate,
    pub relative: bool,
    pub low_confidence: bool,
    pub span: String,
}

/// Parse a single token as an absolute date.
pub fn parse_absolute(token: &str) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE.captures(token) {
        let (y, m, d) = (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some(caps) = DMY_DATE.captures(token) {
        let (d, m, y) = (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    None
}

pub struct RelativeDateRules<'a> {
    pub past_markers: &'a HashSet<String>,
    pub default_direction: RelativeDayDefault,
    /// Resolve "kal"/"parson"; off for English-only input.
    pub urdu_terms: bool,
}

/// Resolve relative day words in normalized text against `today`.
pub fn parse_relative(
    normalized: &str,
    today: NaiveDate,
    rules: &RelativeDateRules<'_>,
) -> Option<DateMatch> {
    for (phrase, offset) in FIXED_OFFSETS {
        if contains_phrase(normalized, phrase) {
            return Some(DateMatch {
                date: today + Duration::days(*offset),
                relative: true,
                low_confidence: false,
                span: phrase.to_string(),
            });
        }
    }

    if !rules.urdu_terms {
        return None;
    }

    for (phrase, magnitude) in AMBIGUOUS_OFFSETS {
        if !contains_phrase(normalized, phrase) {
            continue;
        }

        let past_tense = normalized
            .split_whitespace()
            .any(|token| rules.past_markers.contains(token));

        let (offset, low_confidence) = if past_tense {
            (-magnitude, false)
        } else {
            match rules.default_direction {
                RelativeDayDefault::Future => (*magnitude, true),
                RelativeDayDefault::Past => (-magnitude, true),
            }
        };

        return Some(DateMatch {
            date: today + Duration::days(offset),
            relative: true,
            low_confidence,
            span: phrase.to_string(),
        });
    }

    None
}

pub fn parse_period(normalized: &str) -> Option<Period> {
    PERIODS
        .iter()
        .find(|(phrase, _)| contains_phrase(normalized, phrase))
        .map(|(_, period)| *period)
}

/// Relative day words, used to trim them off task titles.
pub fn is_day_word(token: &str) -> bool {
    FIXED_OFFSETS
        .iter()
        .chain(AMBIGUOUS_OFFSETS.iter())
        .any(|(phrase, _)| *phrase == token)
}
