//! Document preparation ahead of readability scoring.
//!
//! Scripts and styles are stripped with a streaming lol_html pass. The two
//! tree-shaped steps (misused-div retagging and unlikely-candidate pruning)
//! are computed against the parsed tree and returned as [`Edits`].

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{Document, Edits, stream_rewrite};

/// Markup that keeps a `<div>` a block container.
static DIV_TO_P_ELEMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(a|blockquote|dl|div|img|ol|p|pre|table|ul)").unwrap());

static BLACKLIST_CANDIDATES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)popupbody|-ad|g-plus").unwrap());

static UNLIKELY_CANDIDATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)banner|breadcrumbs|combx|comment|community|cover-wrap|disqus|extra|foot|header|legends|menu|modal|related|remark|replies|rss|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup|yom-remote",
    )
    .unwrap()
});

static MAYBE_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)article|body|column|content|main|shadow").unwrap());

/// Remove `<script>` and `<style>` subtrees.
///
/// Falls back to the input when the rewriter rejects the markup.
pub fn strip_scripts_and_styles(html: &str) -> String {
    let settings = lol_html::Settings {
        element_content_handlers: vec![
            lol_html::element!("script", |el| {
                el.remove();
                Ok(())
            }),
            lol_html::element!("style", |el| {
                el.remove();
                Ok(())
            }),
        ],
        ..Default::default()
    };

    stream_rewrite(html, settings).unwrap_or_else(|| html.to_string())
}

/// Whether a `class`/`id` signature marks an element as boilerplate.
pub fn is_unlikely_candidate(signature: &str) -> bool {
    if BLACKLIST_CANDIDATES.is_match(signature) {
        return true;
    }
    UNLIKELY_CANDIDATES.is_match(signature) && !MAYBE_CANDIDATE.is_match(signature)
}

/// Compute the edits that turn a parsed page into a scoring-ready tree.
///
/// Divs without block-level children render as `<p>`; elements other than
/// `html` and `body` whose class/id signature looks like boilerplate are removed.
pub fn prepare_document(doc: &Document) -> Edits {
    let mut edits = Edits::new();

    for el in doc.live_elements(&edits) {
        if el.is("div") && !DIV_TO_P_ELEMENTS.is_match(&el.inner_html()) {
            edits.retag(el.id(), "p");
        }
    }

    for el in doc.live_elements(&edits) {
        if el.is("html") || el.is("body") {
            continue;
        }
        let signature = match (el.attr("class"), el.attr("id")) {
            (None, None) => continue,
            (class, id) => format!("{}{}", class.unwrap_or_default(), id.unwrap_or_default()),
        };
        if is_unlikely_candidate(&signature) {
            edits.remove(el.id());
        }
    }

    edits
}
