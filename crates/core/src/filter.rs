//! Block and keep filters for entries.
//!
//! Each direction is decided by the user's rule list when it has one, and by
//! the feed's single regex otherwise. A rule list holds one `Field=Pattern`
//! rule per line; the first matching line decides. Patterns that fail to
//! compile or parse never match.
//!
//! ```text
//! EntryTitle=(?i)sponsored
//! EntryTag=^ads?$
//! EntryDate=before:2024-01-01
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use tracing::{debug, warn};

use crate::model::{Entry, Feed, User};

/// Entry field a filter rule tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    EntryDate,
    EntryTitle,
    EntryUrl,
    EntryCommentsUrl,
    EntryContent,
    EntryAuthor,
    EntryTag,
}

impl FilterField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "EntryDate" => Some(Self::EntryDate),
            "EntryTitle" => Some(Self::EntryTitle),
            "EntryURL" => Some(Self::EntryUrl),
            "EntryCommentsURL" => Some(Self::EntryCommentsUrl),
            "EntryContent" => Some(Self::EntryContent),
            "EntryAuthor" => Some(Self::EntryAuthor),
            "EntryTag" => Some(Self::EntryTag),
            _ => None,
        }
    }
}

/// Whether the entry should be dropped.
///
/// With no rules at all, nothing is blocked.
pub fn is_blocked(feed: &Feed, entry: &Entry, user: &User) -> bool {
    is_blocked_at(feed, entry, user, Utc::now())
}

/// [`is_blocked`] with an explicit current time for `EntryDate=future`.
pub fn is_blocked_at(feed: &Feed, entry: &Entry, user: &User, now: DateTime<Utc>) -> bool {
    if !user.block_filter_entry_rules.is_empty() {
        return match matching_rule(&user.block_filter_entry_rules, entry, now) {
            Some(line) => {
                debug!(url = %entry.url, rule = %line, "Blocking entry based on user rule");
                true
            }
            None => false,
        };
    }

    if feed.blocklist_rules.is_empty() {
        return false;
    }
    let blocked = matches_feed_regex(&feed.blocklist_rules, entry);
    if blocked {
        debug!(url = %entry.url, rule = %feed.blocklist_rules, "Blocking entry based on feed blocklist");
    }
    blocked
}

/// Whether the entry may be kept.
///
/// With no rules at all, everything is allowed.
pub fn is_allowed(feed: &Feed, entry: &Entry, user: &User) -> bool {
    is_allowed_at(feed, entry, user, Utc::now())
}

/// [`is_allowed`] with an explicit current time for `EntryDate=future`.
pub fn is_allowed_at(feed: &Feed, entry: &Entry, user: &User, now: DateTime<Utc>) -> bool {
    if !user.keep_filter_entry_rules.is_empty() {
        return match matching_rule(&user.keep_filter_entry_rules, entry, now) {
            Some(line) => {
                debug!(url = %entry.url, rule = %line, "Allowing entry based on user rule");
                true
            }
            None => false,
        };
    }

    if feed.keeplist_rules.is_empty() {
        return true;
    }
    matches_feed_regex(&feed.keeplist_rules, entry)
}

/// An entry survives filtering iff it is allowed and not blocked.
pub fn is_kept(feed: &Feed, entry: &Entry, user: &User) -> bool {
    !is_blocked(feed, entry, user) && is_allowed(feed, entry, user)
}

/// First line of a rule list that matches the entry.
fn matching_rule<'r>(rules: &'r str, entry: &Entry, now: DateTime<Utc>) -> Option<&'r str> {
    rules
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| rule_matches(line, entry, now))
}

fn rule_matches(line: &str, entry: &Entry, now: DateTime<Utc>) -> bool {
    let Some((name, pattern)) = line.split_once('=') else {
        return false;
    };
    let Some(field) = FilterField::parse(name) else {
        debug!(field = %name, "Ignoring filter rule with unknown field");
        return false;
    };

    if field == FilterField::EntryDate {
        return is_date_matching_pattern_at(entry.date, pattern, now);
    }

    let Some(re) = compile(pattern) else {
        return false;
    };
    match field {
        FilterField::EntryTitle => re.is_match(&entry.title),
        FilterField::EntryUrl => re.is_match(&entry.url),
        FilterField::EntryCommentsUrl => re.is_match(&entry.comments_url),
        FilterField::EntryContent => re.is_match(&entry.content),
        FilterField::EntryAuthor => re.is_match(&entry.author),
        FilterField::EntryTag => entry.tags.iter().any(|tag| re.is_match(tag)),
        FilterField::EntryDate => false,
    }
}

/// Feed-scope regex over URL, title, author and every tag.
fn matches_feed_regex(pattern: &str, entry: &Entry) -> bool {
    let Some(re) = compile(pattern) else {
        return false;
    };
    re.is_match(&entry.url)
        || re.is_match(&entry.title)
        || re.is_match(&entry.author)
        || entry.tags.iter().any(|tag| re.is_match(tag))
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "Invalid filter pattern");
            None
        }
    }
}

/// Evaluate an `EntryDate` pattern against the current time.
pub fn is_date_matching_pattern(date: DateTime<Utc>, pattern: &str) -> bool {
    is_date_matching_pattern_at(date, pattern, Utc::now())
}

/// Evaluate an `EntryDate` pattern: `future`, `before:D`, `after:D` or
/// `between:D1,D2`, with dates as `YYYY-MM-DD` at UTC midnight.
///
/// All comparisons are strict. Anything malformed is no match.
pub fn is_date_matching_pattern_at(date: DateTime<Utc>, pattern: &str, now: DateTime<Utc>) -> bool {
    let (operator, operand) = match pattern.split_once(':') {
        Some((operator, operand)) => (operator, Some(operand)),
        None => (pattern, None),
    };

    match (operator, operand) {
        ("future", _) => date > now,
        ("before", Some(day)) => parse_day(day).is_some_and(|limit| date < limit),
        ("after", Some(day)) => parse_day(day).is_some_and(|limit| date > limit),
        ("between", Some(range)) => {
            let Some((start, end)) = range.split_once(',') else {
                return false;
            };
            match (parse_day(start), parse_day(end)) {
                (Some(start), Some(end)) => date > start && date < end,
                _ => false,
            }
        }
        _ => {
            debug!(pattern = %pattern, "Unrecognised date pattern");
            false
        }
    }
}

fn parse_day(day: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}
