//! Scrape orchestrator.
//!
//! Fetches an entry's original page and extracts its content, either with a
//! per-site CSS selector or with the readability extractor. Pages that only
//! hold a single link ("continue reading" interstitials) are followed.
//!
//! # Example
//!
//! ```rust,no_run
//! use colligo_core::{ReqwestFetcher, RuleTables, ScrapeConfig, Scraper};
//!
//! # async fn example() -> colligo_core::Result<()> {
//! let fetcher = ReqwestFetcher::new();
//! let scraper = Scraper::new(&fetcher, RuleTables::predefined(), ScrapeConfig::default());
//! let page = scraper.scrape_website("https://example.org/article", "").await?;
//! println!("{} bytes from {}", page.content.len(), page.base_url);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::dom::Document;
use crate::fetch::{FetchOptions, FetchResponse, Fetcher};
use crate::readability::{ExtractConfig, document_base_url, extract_content_with_config};
use crate::rules::{RuleTables, domain};
use crate::{ColligoError, FailureReason, Result};

/// Default bound on followed single-link pages.
pub const DEFAULT_MAX_HOPS: usize = 3;

/// Configuration for the scrape orchestrator.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Maximum number of single-link pages followed after the first fetch (default: 3).
    pub max_hops: usize,
    /// Fetch options used when the caller supplies none.
    pub fetch: FetchOptions,
    /// Proxy used for feeds that ask to be fetched via proxy.
    pub proxy_url: Option<String>,
    /// Readability settings for pages without a site rule.
    pub extract: ExtractConfig,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            fetch: FetchOptions::default(),
            proxy_url: None,
            extract: ExtractConfig::default(),
        }
    }
}

/// Content extracted from a page.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedPage {
    /// URL relative links in `content` resolve against.
    pub base_url: String,
    pub content: String,
}

/// Fetches pages and extracts their content.
pub struct Scraper<'a> {
    fetcher: &'a dyn Fetcher,
    tables: &'a RuleTables,
    config: ScrapeConfig,
}

impl<'a> Scraper<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, tables: &'a RuleTables, config: ScrapeConfig) -> Self {
        Self { fetcher, tables, config }
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Scrape `url` with the configured default fetch options.
    pub async fn scrape_website(&self, url: &str, explicit_rules: &str) -> Result<ScrapedPage> {
        self.scrape_with_options(url, explicit_rules, &self.config.fetch).await
    }

    /// Scrape `url`, following single-link pages.
    ///
    /// Hops to another site drop cookie, credentials and proxy, and ignore
    /// `explicit_rules`, which only describe the original site.
    pub async fn scrape_with_options(
        &self, url: &str, explicit_rules: &str, options: &FetchOptions,
    ) -> Result<ScrapedPage> {
        let origin = domain(url);
        let stripped = options.without_credentials();
        let mut current = url.to_string();
        let mut visited = HashSet::new();
        let mut hops = 0;

        loop {
            if !visited.insert(current.clone()) {
                return Err(ColligoError::RedirectLoop(current));
            }

            let same_origin = domain(&current) == origin;
            let (hop_options, hop_rules) = if same_origin { (options, explicit_rules) } else { (&stripped, "") };

            let page = self.scrape_page(&current, hop_rules, hop_options).await?;

            let Some(next) = single_link_target(&page) else {
                return Ok(page);
            };

            hops += 1;
            if hops > self.config.max_hops {
                return Err(ColligoError::TooManyHops { max_hops: self.config.max_hops });
            }
            debug!(from = %current, to = %next, hops, "Following single-link page");
            current = next;
        }
    }

    /// Fetch and extract one page, without link following.
    async fn scrape_page(&self, url: &str, explicit_rules: &str, options: &FetchOptions) -> Result<ScrapedPage> {
        let response = self.fetch(url, options).await?;

        let effective_domain = domain(&response.effective_url);
        let same_site = domain(url) == effective_domain;

        let rule = if !explicit_rules.trim().is_empty() {
            Some(explicit_rules.trim())
        } else {
            self.tables.scraper_rule(&effective_domain)
        };

        if same_site && let Some(selector) = rule {
            let doc = Document::parse(&response.body);
            match extract_with_selector(&doc, selector) {
                Ok(content) => {
                    debug!(url, selector, "Extracted content with site rule");
                    let base_url = document_base_url(&doc).unwrap_or(response.effective_url);
                    return Ok(ScrapedPage { base_url, content });
                }
                Err(e) => warn!(url, selector, error = %e, "Invalid scraper rule, falling back to readability"),
            }
        }

        let extracted = extract_content_with_config(&response.body, &self.config.extract);
        Ok(ScrapedPage { base_url: extracted.base_url.unwrap_or(response.effective_url), content: extracted.content })
    }

    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse> {
        let response = tokio::time::timeout(Duration::from_secs(options.timeout), self.fetcher.fetch(url, options))
            .await
            .map_err(|_| ColligoError::Timeout { timeout: options.timeout })??;

        if response.status >= 400 {
            return Err(ColligoError::ServerFailure {
                status: response.status,
                reason: FailureReason::from_status(response.status),
            });
        }

        if !response.is_html() {
            return Err(ColligoError::UnsupportedContentType(response.media_type()));
        }

        if response.body.trim().is_empty() {
            return Err(ColligoError::EmptyBody);
        }

        Ok(response)
    }
}

/// Outer HTML of every element matching `selector`, in document order.
pub fn extract_with_selector(doc: &Document, selector: &str) -> Result<String> {
    Ok(doc.select(selector)?.iter().map(|el| el.outer_html()).collect())
}

/// Absolute target of a fragment that is nothing but one link.
pub fn single_link_target(page: &ScrapedPage) -> Option<String> {
    let doc = Document::parse_fragment(&page.content);
    let body = doc.body()?;
    if body.has_own_text() {
        return None;
    }

    let children = body.children();
    let [link] = children.as_slice() else {
        return None;
    };
    if !link.is("a") {
        return None;
    }

    let href = link.attr("href")?.trim();
    if href.is_empty() {
        return None;
    }

    match Url::parse(&page.base_url).and_then(|base| base.join(href)) {
        Ok(target) => Some(target.to_string()),
        Err(e) => {
            debug!(href, base_url = %page.base_url, error = %e, "Cannot resolve single link");
            None
        }
    }
}
