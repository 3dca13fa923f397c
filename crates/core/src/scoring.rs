//! Candidate scoring for readability extraction.
//!
//! Scores accumulate on the parent and grandparent of every paragraph-like
//! element; the element itself is never a candidate. Candidates are kept in
//! the order they are first created so that ties resolve reproducibly.

use std::collections::HashMap;
use std::sync::LazyLock;

use ego_tree::NodeId;
use regex::Regex;

use crate::dom::{Edits, Element};

static NEGATIVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)hid|banner|combx|comment|com-|contact|foot|masthead|media|meta|modal|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|tool|widget|byline|author|dateline|writtenby|p-author",
    )
    .unwrap()
});

static POSITIVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)article|body|content|entry|hentry|h-entry|main|page|pagination|post|text|blog|story").unwrap()
});

/// Weight applied per matching `class` or `id` attribute.
const CLASS_WEIGHT: f64 = 25.0;

/// Base score for an element based on its (rendered) tag name.
///
/// - DIV: +5
/// - PRE, TD, BLOCKQUOTE, IMG: +3
/// - ADDRESS, OL, UL, DL, DD, DT, LI, FORM: -3
/// - H1-H6, TH: -5
pub fn tag_base_score(tag: &str) -> f64 {
    match tag {
        "div" => 5.0,
        "pre" | "td" | "blockquote" | "img" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    }
}

fn attribute_weight(value: Option<&str>) -> f64 {
    let Some(value) = value else {
        return 0.0;
    };
    let mut weight = 0.0;
    if NEGATIVE_PATTERN.is_match(value) {
        weight -= CLASS_WEIGHT;
    }
    if POSITIVE_PATTERN.is_match(value) {
        weight += CLASS_WEIGHT;
    }
    weight
}

/// Class/ID weight: each of `class` and `id` takes -25 for a negative match
/// and +25 for a positive one, all added together.
pub fn class_weight(element: &Element<'_>) -> f64 {
    attribute_weight(element.attr("class")) + attribute_weight(element.attr("id"))
}

/// Score contributed by one paragraph-like element's text.
///
/// `1 + (commas + 1) + min(floor(len / 100), 3)`
pub fn content_score(text: &str) -> f64 {
    let commas = text.matches(',').count() as f64;
    let length_bonus = ((text.chars().count() / 100) as f64).min(3.0);
    1.0 + (commas + 1.0) + length_bonus
}

/// Ratio of text inside `<a>` descendants to all text of the element.
///
/// Both lengths skip subtrees removed by `edits`, so the ratio stays within
/// 0..=1. Returns 0.0 when the element has no text.
pub fn link_density(element: &Element<'_>, edits: &Edits) -> f64 {
    let (text_length, link_length) = element.text_len_with(edits, "a");
    if text_length == 0 {
        return 0.0;
    }

    link_length as f64 / text_length as f64
}

/// A DOM node plus its accumulated score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: NodeId,
    pub score: f64,
}

/// Insertion-ordered candidate set.
#[derive(Debug, Default)]
pub struct Candidates {
    entries: Vec<Candidate>,
    index: HashMap<NodeId, usize>,
}

impl Candidates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Candidate> {
        self.index.get(&id).map(|&i| &self.entries[i])
    }

    /// Initialise a candidate for `element` unless one exists already.
    pub fn ensure(&mut self, element: &Element<'_>, edits: &Edits) {
        if self.index.contains_key(&element.id()) {
            return;
        }
        let score = tag_base_score(edits.tag_name(element)) + class_weight(element);
        self.index.insert(element.id(), self.entries.len());
        self.entries.push(Candidate { id: element.id(), score });
    }

    pub fn add(&mut self, id: NodeId, amount: f64) {
        if let Some(&i) = self.index.get(&id) {
            self.entries[i].score += amount;
        }
    }

    pub fn scale(&mut self, id: NodeId, factor: f64) {
        if let Some(&i) = self.index.get(&id) {
            self.entries[i].score *= factor;
        }
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.entries.iter().map(|c| c.id).collect()
    }

    /// Highest score; the earliest-created candidate wins a tie.
    pub fn top(&self) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for candidate in &self.entries {
            match best {
                Some(b) if candidate.score <= b.score => {}
                _ => best = Some(*candidate),
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn first<'a>(doc: &'a Document, selector: &str) -> Element<'a> {
        doc.select(selector).unwrap()[0]
    }

    #[test]
    fn test_tag_base_scores() {
        assert_eq!(tag_base_score("div"), 5.0);
        assert_eq!(tag_base_score("pre"), 3.0);
        assert_eq!(tag_base_score("img"), 3.0);
        assert_eq!(tag_base_score("form"), -3.0);
        assert_eq!(tag_base_score("li"), -3.0);
        assert_eq!(tag_base_score("th"), -5.0);
        assert_eq!(tag_base_score("h1"), -5.0);
        assert_eq!(tag_base_score("section"), 0.0);
        assert_eq!(tag_base_score("p"), 0.0);
    }

    #[test]
    fn test_class_weight_positive() {
        let doc = Document::parse(r#"<div class="article-body">Content</div>"#);
        assert_eq!(class_weight(&first(&doc, "div")), 25.0);
    }

    #[test]
    fn test_class_weight_negative() {
        let doc = Document::parse(r#"<div class="sidebar">Content</div>"#);
        assert_eq!(class_weight(&first(&doc, "div")), -25.0);
    }

    #[test]
    fn test_class_and_id_add_up() {
        let doc = Document::parse(r#"<div class="post" id="story">Content</div>"#);
        assert_eq!(class_weight(&first(&doc, "div")), 50.0);

        let doc = Document::parse(r#"<div class="post" id="share">Content</div>"#);
        assert_eq!(class_weight(&first(&doc, "div")), 0.0);
    }

    #[test]
    fn test_negative_and_positive_cancel_within_one_attribute() {
        let doc = Document::parse(r#"<div class="content author">Content</div>"#);
        assert_eq!(class_weight(&first(&doc, "div")), 0.0);

        let doc = Document::parse(r#"<div class="content author" id="story">Content</div>"#);
        assert_eq!(class_weight(&first(&doc, "div")), 25.0);
    }

    #[test]
    fn test_class_weight_no_match() {
        let doc = Document::parse(r#"<div class="random">Content</div>"#);
        assert_eq!(class_weight(&first(&doc, "div")), 0.0);
    }

    #[test]
    fn test_content_score() {
        assert_eq!(content_score("short"), 2.0);
        assert_eq!(content_score("one, two, three"), 4.0);
        assert_eq!(content_score(&"a".repeat(250)), 4.0);
        assert_eq!(content_score(&"a".repeat(1000)), 5.0);
    }

    #[test]
    fn test_content_score_counts_chars() {
        assert_eq!(content_score(&"é".repeat(99)), 2.0);
    }

    #[test]
    fn test_link_density_no_links() {
        let doc = Document::parse("<div>Plain text with no links at all</div>");
        assert_eq!(link_density(&first(&doc, "div"), &Edits::new()), 0.0);
    }

    #[test]
    fn test_link_density_empty_text() {
        let doc = Document::parse("<div><img src=a.png></div>");
        assert_eq!(link_density(&first(&doc, "div"), &Edits::new()), 0.0);
    }

    #[test]
    fn test_link_density_mixed() {
        let doc = Document::parse(r#"<div>Text <a href="/x">link</a> more</div>"#);
        let density = link_density(&first(&doc, "div"), &Edits::new());
        assert!((density - 4.0 / 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_link_density_all_links() {
        let doc = Document::parse(r#"<div><a href="/a">one</a><a href="/b">two</a></div>"#);
        assert_eq!(link_density(&first(&doc, "div"), &Edits::new()), 1.0);
    }

    #[test]
    fn test_link_density_skips_pruned_links() {
        let doc = Document::parse(
            r#"<div id="story"><p>The river rose overnight, and the ferry will not run until the water drops.</p><div class="social"><a href="/1">Share this story with your friends</a><a href="/2">Share this story on every network</a></div></div>"#,
        );
        let edits = crate::preprocess::prepare_document(&doc);
        assert_eq!(link_density(&first(&doc, "#story"), &edits), 0.0);
        assert!(link_density(&first(&doc, "#story"), &Edits::new()) < 1.0);
    }

    #[test]
    fn test_candidates_keep_insertion_order_on_ties() {
        let doc = Document::parse(r#"<div id="a"></div><div id="b"></div>"#);
        let edits = Edits::new();
        let a = first(&doc, "#a");
        let b = first(&doc, "#b");

        let mut candidates = Candidates::new();
        candidates.ensure(&a, &edits);
        candidates.ensure(&b, &edits);
        candidates.ensure(&a, &edits);
        assert_eq!(candidates.len(), 2);

        assert_eq!(candidates.top().unwrap().id, a.id());

        candidates.add(b.id(), 0.5);
        assert_eq!(candidates.top().unwrap().id, b.id());
    }

    #[test]
    fn test_candidate_uses_rendered_tag() {
        let doc = Document::parse(r#"<div id="a">text</div>"#);
        let a = first(&doc, "#a");
        let mut edits = Edits::new();
        edits.retag(a.id(), "p");

        let mut candidates = Candidates::new();
        candidates.ensure(&a, &edits);
        assert_eq!(candidates.get(a.id()).unwrap().score, 0.0);
    }
}
