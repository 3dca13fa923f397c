//! Entry, feed and user records consumed by the pipeline.
//!
//! These are the normalized records a feed-format parser produces. Only the
//! fields the content pipeline reads are modelled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One feed item.
///
/// `content` is HTML and is always a (possibly empty) string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    pub url: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub tags: Vec<String>,
    pub date: DateTime<Utc>,
    pub comments_url: String,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            url: String::new(),
            title: String::new(),
            content: String::new(),
            author: String::new(),
            tags: Vec::new(),
            date: DateTime::<Utc>::UNIX_EPOCH,
            comments_url: String::new(),
        }
    }
}

impl Entry {
    pub fn new(url: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self { url: url.into(), title: title.into(), content: content.into(), ..Default::default() }
    }
}

/// Per-feed settings that drive scraping, rewriting and filtering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feed {
    pub site_url: String,
    /// Fetch the original page for new entries instead of using the feed content.
    pub crawler: bool,
    /// CSS selector overriding the predefined scraper table.
    pub scraper_rules: String,
    /// Rewrite rule list overriding the predefined rewrite table.
    pub rewrite_rules: String,
    /// `rewrite("pattern"|"replacement")` applied to entry URLs.
    pub url_rewrite_rules: String,
    /// Regex; matching entries are dropped.
    pub blocklist_rules: String,
    /// Regex; only matching entries are kept.
    pub keeplist_rules: String,

    pub user_agent: String,
    pub cookie: String,
    pub username: String,
    pub password: String,
    pub fetch_via_proxy: bool,
    pub allow_self_signed_certificates: bool,
    pub disable_http2: bool,
}

/// User-scoped filter rules (`Field=Pattern` per line).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub block_filter_entry_rules: String,
    pub keep_filter_entry_rules: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_deserializes_with_missing_fields() {
        let entry: Entry = serde_json::from_str(r#"{"url": "https://example.org/a", "title": "A"}"#).unwrap();
        assert_eq!(entry.url, "https://example.org/a");
        assert_eq!(entry.content, "");
        assert!(entry.tags.is_empty());
        assert_eq!(entry.date, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_entry_date_is_rfc3339() {
        let entry: Entry = serde_json::from_str(r#"{"date": "2024-06-15T12:00:00Z"}"#).unwrap();
        assert_eq!(entry.date.to_rfc3339(), "2024-06-15T12:00:00+00:00");
    }

    #[test]
    fn test_feed_defaults() {
        let feed: Feed = serde_json::from_str(r#"{"crawler": true}"#).unwrap();
        assert!(feed.crawler);
        assert!(feed.scraper_rules.is_empty());
        assert!(!feed.disable_http2);
    }
}
