pub mod dom;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod readability;
pub mod rewrite;
pub mod rules;
pub mod scoring;
pub mod scrape;

pub use dom::{Document, Edits, Element};
pub use error::{ColligoError, FailureReason, Result};
#[cfg(feature = "fetch")]
pub use fetch::ReqwestFetcher;
pub use fetch::{FetchOptions, FetchResponse, Fetcher, decode_html, fetch_file, fetch_stdin};
pub use filter::{is_allowed, is_blocked, is_date_matching_pattern, is_date_matching_pattern_at, is_kept};
pub use model::{Entry, Feed, User};
pub use pipeline::Pipeline;
pub use readability::{
    EMPTY_CONTENT, ExtractConfig, ExtractConfigBuilder, ExtractedContent, extract_content, extract_content_with_config,
};
pub use rewrite::{RewriteConfig, RewriteRule, Rewriter, rewrite_entry_url};
pub use rules::{ConfigLoader, ConfigParser, Directive, RuleTables, domain};
#[doc(hidden)]
pub use scoring::{Candidate, Candidates, class_weight, content_score, link_density, tag_base_score};
pub use scrape::{ScrapeConfig, ScrapedPage, Scraper, single_link_target};
