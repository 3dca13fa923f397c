//! Readability content extraction.
//!
//! Decides which part of an arbitrary HTML page is the article without any
//! site configuration. The main entry point is [`extract_content`]; use
//! [`extract_content_with_config`] to tune thresholds.
//!
//! # Example
//!
//! ```rust
//! use colligo_core::readability::extract_content;
//!
//! let html = r#"<html><body><div class="post">
//!     <p>The first paragraph of the article, long enough to be scored, with commas, too.</p>
//!     <p>The second paragraph continues the story and it also reads like prose.</p>
//! </div></body></html>"#;
//!
//! let extracted = extract_content(html);
//! assert!(extracted.content.starts_with("<div>"));
//! assert!(extracted.content.contains("second paragraph"));
//! ```

use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;
use tracing::debug;
use url::Url;

use crate::dom::{Document, Edits, Element};
use crate::preprocess::{prepare_document, strip_scripts_and_styles};
use crate::scoring::{Candidates, content_score, link_density};

static SENTENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.( |$)").unwrap());

const TAGS_TO_SCORE: &[&str] = &["section", "h2", "h3", "h4", "h5", "h6", "p", "td", "pre", "div"];

static HEAD_BASE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("head base[href]").unwrap());

/// Output of an empty extraction.
pub const EMPTY_CONTENT: &str = "<div></div>";

/// Configuration for readability extraction.
///
/// # Example
///
/// ```rust
/// use colligo_core::ExtractConfig;
///
/// let config = ExtractConfig::builder()
///     .min_text_length(40)
///     .max_scored_elements(500)
///     .build();
/// assert_eq!(config.min_text_length, 40);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Paragraph-like elements with less text are not scored (default: 25).
    pub min_text_length: usize,

    /// Share of the top score a sibling needs to be kept (default: 0.2).
    pub sibling_threshold_ratio: f64,

    /// Lower bound of the sibling threshold (default: 10.0).
    pub min_sibling_threshold: f64,

    /// Maximum number of paragraph-like elements scored (default: 10 000).
    pub max_scored_elements: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { min_text_length: 25, sibling_threshold_ratio: 0.2, min_sibling_threshold: 10.0, max_scored_elements: 10_000 }
    }
}

impl ExtractConfig {
    /// Creates a new builder for ExtractConfig.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::new()
    }

    /// Score a sibling of the top candidate must reach to be kept.
    pub fn sibling_threshold(&self, top_score: f64) -> f64 {
        self.min_sibling_threshold.max(top_score * self.sibling_threshold_ratio)
    }
}

/// Builder for ExtractConfig.
#[derive(Debug, Default)]
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_text_length(mut self, length: usize) -> Self {
        self.config.min_text_length = length;
        self
    }

    pub fn sibling_threshold_ratio(mut self, ratio: f64) -> Self {
        self.config.sibling_threshold_ratio = ratio;
        self
    }

    pub fn min_sibling_threshold(mut self, threshold: f64) -> Self {
        self.config.min_sibling_threshold = threshold;
        self
    }

    pub fn max_scored_elements(mut self, max: usize) -> Self {
        self.config.max_scored_elements = max;
        self
    }

    pub fn build(self) -> ExtractConfig {
        self.config
    }
}

/// Result of a readability extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    /// Article HTML: a `<div>` wrapping the kept nodes.
    pub content: String,
    /// Absolute `<base href>` declared by the page, if any.
    pub base_url: Option<String>,
    /// Score of the winning candidate (0.0 when nothing was scored).
    pub top_score: f64,
}

/// Extract the main content of a page using the default configuration.
///
/// Never fails: malformed markup is repaired by the parser and a page with no
/// usable candidate yields `<div></div>`.
pub fn extract_content(html: &str) -> ExtractedContent {
    extract_content_with_config(html, &ExtractConfig::default())
}

/// Extract the main content of a page.
pub fn extract_content_with_config(html: &str, config: &ExtractConfig) -> ExtractedContent {
    let stripped = strip_scripts_and_styles(html);
    let doc = Document::parse(&stripped);
    let base_url = document_base_url(&doc);
    let edits = prepare_document(&doc);

    let candidates = score_candidates(&doc, &edits, config);

    let top = match candidates.top() {
        Some(top) if top.score > 0.0 => top,
        _ => {
            debug!(candidates = candidates.len(), "No candidate scored above zero");
            return ExtractedContent { content: EMPTY_CONTENT.to_string(), base_url, top_score: 0.0 };
        }
    };

    let Some(top_element) = doc.get(top.id) else {
        return ExtractedContent { content: EMPTY_CONTENT.to_string(), base_url, top_score: 0.0 };
    };

    let content = gather_siblings(&top_element, top.score, &candidates, &edits, config);
    ExtractedContent { content, base_url, top_score: top.score }
}

/// Absolute `<head><base href>` of a document.
pub fn document_base_url(doc: &Document) -> Option<String> {
    let href = doc.select_with(&HEAD_BASE).first()?.attr("href")?.trim().to_string();
    match Url::parse(&href) {
        Ok(url) if url.has_host() => Some(href),
        _ => None,
    }
}

/// Scoring pass plus link-density decay.
fn score_candidates(doc: &Document, edits: &Edits, config: &ExtractConfig) -> Candidates {
    let mut candidates = Candidates::new();
    let mut scored = 0usize;

    for element in doc.live_elements(edits) {
        if !TAGS_TO_SCORE.contains(&edits.tag_name(&element)) {
            continue;
        }

        if scored >= config.max_scored_elements {
            debug!(limit = config.max_scored_elements, "Scored element limit reached");
            break;
        }
        scored += 1;

        let text = element.text_with(edits);
        if text.chars().count() < config.min_text_length {
            continue;
        }

        let Some(parent) = element.parent() else {
            continue;
        };
        let grandparent = parent.parent();

        candidates.ensure(&parent, edits);
        if let Some(grandparent) = &grandparent {
            candidates.ensure(grandparent, edits);
        }

        let score = content_score(&text);
        candidates.add(parent.id(), score);
        if let Some(grandparent) = &grandparent {
            candidates.add(grandparent.id(), score / 2.0);
        }
    }

    for id in candidates.ids() {
        if let Some(element) = doc.get(id) {
            candidates.scale(id, 1.0 - link_density(&element, edits));
        }
    }

    candidates
}

/// Collect the top candidate and the siblings worth keeping.
fn gather_siblings(
    top: &Element<'_>, top_score: f64, candidates: &Candidates, edits: &Edits, config: &ExtractConfig,
) -> String {
    let threshold = config.sibling_threshold(top_score);
    let mut output = String::from("<div>");

    for sibling in top.siblings_and_self() {
        if edits.is_removed(sibling.id()) {
            continue;
        }

        let mut append = sibling.id() == top.id()
            || candidates.get(sibling.id()).is_some_and(|c| c.score >= threshold);

        let tag = edits.tag_name(&sibling);
        if tag == "p" {
            let text = sibling.text_with(edits);
            let length = text.chars().count();
            let density = link_density(&sibling, edits);
            if (length >= 80 && density < 0.25) || (length < 80 && density == 0.0 && SENTENCE.is_match(&text)) {
                append = true;
            }
        }

        if append {
            let wrapper = if tag == "p" { "p" } else { "div" };
            output.push('<');
            output.push_str(wrapper);
            output.push('>');
            output.push_str(&sibling.inner_html_with(edits));
            output.push_str("</");
            output.push_str(wrapper);
            output.push('>');
        }
    }

    output.push_str("</div>");
    output
}
