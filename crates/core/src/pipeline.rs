//! Per-feed entry processing: filter, scrape, rewrite.
//!
//! Entries arrive newest first, as feeds list them, and are processed oldest
//! first, one at a time. Sanitizing the final content is left to the caller.

use tracing::{debug, warn};

use crate::fetch::{FetchOptions, Fetcher};
use crate::filter::{is_allowed, is_blocked};
use crate::model::{Entry, Feed, User};
use crate::rewrite::{RewriteConfig, Rewriter, rewrite_entry_url};
use crate::rules::RuleTables;
use crate::scrape::{ScrapeConfig, Scraper};

/// Runs the filter, scrape and rewrite stages over a feed's entries.
pub struct Pipeline<'a> {
    scraper: Scraper<'a>,
    rewriter: Rewriter<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher, tables: &'a RuleTables, scrape_config: ScrapeConfig, rewrite_config: RewriteConfig,
    ) -> Self {
        Self { scraper: Scraper::new(fetcher, tables, scrape_config), rewriter: Rewriter::new(tables, rewrite_config) }
    }

    pub fn scraper(&self) -> &Scraper<'a> {
        &self.scraper
    }

    pub fn rewriter(&self) -> &Rewriter<'a> {
        &self.rewriter
    }

    /// Filter and enrich a feed's entries.
    ///
    /// Blocked or disallowed entries are dropped. For crawler feeds, entries
    /// for which `is_new` holds are scraped; a failed scrape keeps the feed's
    /// own content. Every kept entry is then rewritten. The result keeps the
    /// input order.
    pub async fn process_feed_entries(
        &self, feed: &Feed, user: &User, entries: Vec<Entry>, is_new: impl Fn(&Entry) -> bool,
    ) -> Vec<Entry> {
        let options = FetchOptions::for_feed(feed, &self.scraper.config().fetch, self.scraper.config().proxy_url.as_deref());
        let mut kept = Vec::with_capacity(entries.len());

        for mut entry in entries.into_iter().rev() {
            if is_blocked(feed, &entry, user) || !is_allowed(feed, &entry, user) {
                debug!(url = %entry.url, "Entry filtered out");
                continue;
            }

            let entry_url = rewrite_entry_url(feed, &entry);

            if feed.crawler && is_new(&entry) {
                match self.scraper.scrape_with_options(&entry_url, &feed.scraper_rules, &options).await {
                    Ok(page) if !page.content.is_empty() => {
                        debug!(url = %entry_url, base_url = %page.base_url, "Replaced entry content with scraped page");
                        entry.content = page.content;
                    }
                    Ok(_) => debug!(url = %entry_url, "Scrape returned no content"),
                    Err(e) => warn!(url = %entry_url, error = %e, "Unable to scrape entry, keeping feed content"),
                }
            }

            self.rewriter.rewrite(&entry_url, &mut entry, &feed.rewrite_rules);
            kept.push(entry);
        }

        kept.reverse();
        kept
    }
}
