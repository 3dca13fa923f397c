//! HTML parsing, querying and deterministic re-serialization.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! HTML and navigating the DOM tree using CSS selectors, plus an [`Edits`]
//! overlay used to render a transformed copy of the tree without mutating it.
//!
//! Every node is addressed by its ego-tree [`NodeId`], an arena index assigned
//! once while the document is built. Ids are stable for the lifetime of the
//! [`Document`] and follow document order.
//!
//! # Example
//!
//! ```rust
//! use colligo_core::dom::{Document, Edits};
//!
//! let doc = Document::parse_fragment(r#"<p class="ad">Buy</p><p>Read</p>"#);
//! let mut edits = Edits::new();
//! for el in doc.select("p.ad").unwrap() {
//!     edits.remove(el.id());
//! }
//! assert_eq!(doc.render_body(&edits), "<p>Read</p>");
//! ```

use std::collections::HashMap;

use ego_tree::iter::Edge;
use ego_tree::{NodeId, NodeRef};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::{ColligoError, Result};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children are written without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Parses a CSS selector, mapping failures to [`ColligoError::HtmlParseError`].
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ColligoError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// Runs a streaming lol_html pass over `html`.
///
/// Markup outside the handlers' selectors comes back byte for byte. `None`
/// when the rewriter rejects the input or a handler fails.
pub fn stream_rewrite(html: &str, settings: lol_html::Settings<'_, '_>) -> Option<String> {
    let mut output: Vec<u8> = Vec::with_capacity(html.len());
    let mut rewriter = lol_html::HtmlRewriter::new(settings, |c: &[u8]| output.extend_from_slice(c));

    if rewriter.write(html.as_bytes()).is_err() {
        return None;
    }
    if rewriter.end().is_err() {
        return None;
    }

    Some(String::from_utf8_lossy(&output).into_owned())
}

/// Represents a parsed HTML document or fragment.
///
/// Full pages go through [`Document::parse`]. Entry content goes through
/// [`Document::parse_fragment`], which keeps every node where it was written;
/// its markup is read back with [`Document::body_html`].
pub struct Document {
    html: Html,
    fragment: bool,
}

impl Document {
    /// Parses a full page. Malformed markup is repaired, never rejected.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html), fragment: false }
    }

    /// Parses markup as the content of a `<body>`.
    ///
    /// Leading `<noscript>`, `<link>`, `<meta>` or `<style>` elements stay in
    /// place instead of moving into a synthesized `<head>`.
    pub fn parse_fragment(html: &str) -> Self {
        Self { html: Html::parse_fragment(html), fragment: true }
    }

    /// Whether this was parsed with [`Document::parse_fragment`].
    pub fn is_fragment(&self) -> bool {
        self.fragment
    }

    /// Returns a reference to the underlying `scraper::Html` instance.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Selects elements using a CSS selector, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`ColligoError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.select_with(&sel))
    }

    /// Selects elements using an already parsed selector.
    pub fn select_with(&'_ self, selector: &Selector) -> Vec<Element<'_>> {
        self.html.select(selector).map(Element::from).collect()
    }

    /// Looks an element up by its node id.
    pub fn get(&'_ self, id: NodeId) -> Option<Element<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap).map(Element::from)
    }

    /// The `<body>` element, which html5ever always synthesizes. For a
    /// fragment this is the element holding the top-level nodes.
    pub fn body(&'_ self) -> Option<Element<'_>> {
        if self.fragment {
            return Some(Element::from(self.html.root_element()));
        }
        self.html
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "body")
            .map(Element::from)
    }

    /// Gets the title of the document.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html.select(&selector).next().map(|el| el.text().collect::<String>())
    }

    /// Renders the whole document.
    pub fn render(&self, edits: &Edits) -> String {
        let mut out = String::new();
        serialize_node(self.html.tree.root(), edits, &mut out);
        out
    }

    /// Renders the children of `<body>`, plus anything appended to it.
    pub fn render_body(&self, edits: &Edits) -> String {
        let mut out = String::new();
        if let Some(body) = self.body() {
            for child in body.element.children() {
                serialize_node(child, edits, &mut out);
            }
            for edit in edits.get(body.id()) {
                if let Edit::AppendHtml(html) = edit {
                    out.push_str(html);
                }
            }
        }
        out
    }

    /// Inner HTML of `<body>` without any edits.
    pub fn body_html(&self) -> String {
        self.render_body(&Edits::new())
    }

    /// Elements in document order, skipping removed subtrees.
    pub fn live_elements(&'_ self, edits: &Edits) -> Vec<Element<'_>> {
        let mut elements = Vec::new();
        let mut removed: Option<NodeId> = None;
        for edge in self.html.tree.root().traverse() {
            match edge {
                Edge::Open(node) => {
                    if removed.is_some() {
                        continue;
                    }
                    if edits.is_removed(node.id()) {
                        removed = Some(node.id());
                        continue;
                    }
                    if let Some(el) = ElementRef::wrap(node) {
                        elements.push(Element::from(el));
                    }
                }
                Edge::Close(node) => {
                    if removed == Some(node.id()) {
                        removed = None;
                    }
                }
            }
        }
        elements
    }
}

/// A wrapper around scraper's ElementRef for easier DOM navigation.
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> From<ElementRef<'a>> for Element<'a> {
    fn from(element: ElementRef<'a>) -> Self {
        Self { element }
    }
}

impl<'a> Element<'a> {
    /// The arena id of this element.
    pub fn id(&self) -> NodeId {
        self.element.id()
    }

    /// Returns the lowercase tag name (e.g., "div", "a", "span").
    pub fn tag_name(&self) -> &'a str {
        self.element.value().name()
    }

    /// Checks the tag name.
    pub fn is(&self, tag: &str) -> bool {
        self.tag_name() == tag
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the text content of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        let edits = Edits::new();
        for child in self.element.children() {
            serialize_node(child, &edits, &mut out);
        }
        out
    }

    /// Inner HTML rendered through `edits`.
    pub fn inner_html_with(&self, edits: &Edits) -> String {
        let mut out = String::new();
        for child in self.element.children() {
            serialize_node(child, edits, &mut out);
        }
        out
    }

    /// Text content, skipping subtrees removed by `edits`.
    pub fn text_with(&self, edits: &Edits) -> String {
        if edits.is_empty() {
            return self.text();
        }
        let mut text = String::new();
        let mut removed: Option<NodeId> = None;
        for edge in self.element.traverse() {
            match edge {
                Edge::Open(node) => {
                    if removed.is_some() {
                        continue;
                    }
                    if edits.is_removed(node.id()) {
                        removed = Some(node.id());
                    } else if let Node::Text(t) = node.value() {
                        text.push_str(t);
                    }
                }
                Edge::Close(node) => {
                    if removed == Some(node.id()) {
                        removed = None;
                    }
                }
            }
        }
        text
    }

    /// Char counts of live text: all of it, and the part inside `tag`
    /// descendants. Subtrees removed by `edits` count toward neither.
    pub fn text_len_with(&self, edits: &Edits, tag: &str) -> (usize, usize) {
        let mut total = 0;
        let mut inside = 0;
        let mut open_tags = 0usize;
        let mut removed: Option<NodeId> = None;

        for edge in self.element.traverse() {
            match edge {
                Edge::Open(node) => {
                    if removed.is_some() {
                        continue;
                    }
                    if edits.is_removed(node.id()) {
                        removed = Some(node.id());
                        continue;
                    }
                    match node.value() {
                        Node::Text(text) => {
                            let length = text.chars().count();
                            total += length;
                            if open_tags > 0 {
                                inside += length;
                            }
                        }
                        Node::Element(el) if el.name() == tag && node.id() != self.id() => open_tags += 1,
                        _ => {}
                    }
                }
                Edge::Close(node) => {
                    if let Some(id) = removed {
                        if id == node.id() {
                            removed = None;
                        }
                        continue;
                    }
                    if let Node::Element(el) = node.value()
                        && el.name() == tag
                        && node.id() != self.id()
                    {
                        open_tags -= 1;
                    }
                }
            }
        }

        (total, inside)
    }

    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        serialize_node(*self.element, &Edits::new(), &mut out);
        out
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`ColligoError::HtmlParseError`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.select_with(&sel))
    }

    /// Selects descendant elements using an already parsed selector.
    pub fn select_with(&self, selector: &Selector) -> Vec<Element<'a>> {
        self.element.select(selector).map(Element::from).collect()
    }

    /// The parent element, if the parent is an element.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(ElementRef::wrap).map(Element::from)
    }

    /// Element children in document order.
    pub fn children(&self) -> Vec<Element<'a>> {
        self.element.children().filter_map(ElementRef::wrap).map(Element::from).collect()
    }

    /// This element and its element siblings, in document order.
    pub fn siblings_and_self(&self) -> Vec<Element<'a>> {
        match self.element.parent() {
            Some(parent) => parent.children().filter_map(ElementRef::wrap).map(Element::from).collect(),
            None => vec![*self],
        }
    }

    /// Descendant text nodes as `(id, text)`, in document order.
    pub fn text_nodes(&self) -> Vec<(NodeId, &'a str)> {
        self.element
            .descendants()
            .filter_map(|node| match node.value() {
                Node::Text(text) => Some((node.id(), &**text)),
                _ => None,
            })
            .collect()
    }

    /// Whether any direct text child carries non-whitespace characters.
    pub fn has_own_text(&self) -> bool {
        self.element.children().any(|child| match child.value() {
            Node::Text(text) => !text.trim().is_empty(),
            _ => false,
        })
    }
}

/// A single change applied while rendering.
#[derive(Debug, Clone, PartialEq)]
enum Edit {
    Remove,
    Unwrap,
    Retag(String),
    Replace(String),
    SetAttr(String, String),
    SetInnerHtml(String),
    AppendHtml(String),
}

/// A set of changes keyed by node id, applied by the serializer.
///
/// Removal and replacement win over every other edit on the same node.
#[derive(Debug, Default, Clone)]
pub struct Edits {
    edits: HashMap<NodeId, Vec<Edit>>,
}

impl Edits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    fn push(&mut self, id: NodeId, edit: Edit) {
        self.edits.entry(id).or_default().push(edit);
    }

    /// Drops the node and its subtree.
    pub fn remove(&mut self, id: NodeId) {
        self.push(id, Edit::Remove);
    }

    /// Drops the element's tags but keeps its children.
    pub fn unwrap(&mut self, id: NodeId) {
        self.push(id, Edit::Unwrap);
    }

    /// Renders the element under a different tag name.
    pub fn retag(&mut self, id: NodeId, tag: &str) {
        self.push(id, Edit::Retag(tag.to_string()));
    }

    /// Renders `html` in place of the node and its subtree.
    pub fn replace(&mut self, id: NodeId, html: impl Into<String>) {
        self.push(id, Edit::Replace(html.into()));
    }

    /// Sets (or adds) an attribute.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        self.push(id, Edit::SetAttr(name.to_string(), value.to_string()));
    }

    /// Renders `html` in place of the element's children.
    pub fn set_inner_html(&mut self, id: NodeId, html: impl Into<String>) {
        self.push(id, Edit::SetInnerHtml(html.into()));
    }

    /// Renders `html` after the element's last child.
    pub fn append_html(&mut self, id: NodeId, html: impl Into<String>) {
        self.push(id, Edit::AppendHtml(html.into()));
    }

    /// Whether the node itself is marked for removal.
    pub fn is_removed(&self, id: NodeId) -> bool {
        self.get(id).contains(&Edit::Remove)
    }

    /// The tag name an element renders under once retags apply.
    pub fn tag_name<'a>(&'a self, element: &Element<'a>) -> &'a str {
        tag_name_for(element.element.value(), self.get(element.id()))
    }

    fn get(&self, id: NodeId) -> &[Edit] {
        self.edits.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// How the serializer treats the subtree it is currently inside.
enum Skip {
    Whole(NodeId),
    Children(NodeId),
}

/// Serializes one node and its subtree through `edits`.
///
/// The walk uses ego-tree's open/close edges, so arbitrarily deep documents do
/// not grow the call stack.
fn serialize_node(node: NodeRef<'_, Node>, edits: &Edits, out: &mut String) {
    let mut skip: Option<Skip> = None;

    for edge in node.traverse() {
        match edge {
            Edge::Open(current) => {
                if skip.is_some() {
                    continue;
                }
                match current.value() {
                    Node::Element(element) => {
                        let node_edits = edits.get(current.id());
                        if node_edits.contains(&Edit::Remove) {
                            skip = Some(Skip::Whole(current.id()));
                            continue;
                        }
                        if let Some(html) = node_edits.iter().find_map(|e| match e {
                            Edit::Replace(html) => Some(html),
                            _ => None,
                        }) {
                            out.push_str(html);
                            skip = Some(Skip::Whole(current.id()));
                            continue;
                        }
                        if node_edits.contains(&Edit::Unwrap) {
                            continue;
                        }

                        write_start_tag(element, node_edits, out);
                        if let Some(html) = node_edits.iter().rev().find_map(|e| match e {
                            Edit::SetInnerHtml(html) => Some(html),
                            _ => None,
                        }) {
                            out.push_str(html);
                            skip = Some(Skip::Children(current.id()));
                        }
                    }
                    Node::Text(text) => {
                        let node_edits = edits.get(current.id());
                        if node_edits.contains(&Edit::Remove) {
                            continue;
                        }
                        if let Some(html) = node_edits.iter().find_map(|e| match e {
                            Edit::Replace(html) => Some(html),
                            _ => None,
                        }) {
                            out.push_str(html);
                            continue;
                        }
                        let raw = current
                            .parent()
                            .and_then(|p| p.value().as_element().map(|el| RAW_TEXT_ELEMENTS.contains(&el.name())))
                            .unwrap_or(false);
                        if raw {
                            out.push_str(text);
                        } else {
                            out.push_str(&html_escape::encode_text(&**text));
                        }
                    }
                    Node::Comment(comment) => {
                        out.push_str("<!--");
                        out.push_str(comment);
                        out.push_str("-->");
                    }
                    Node::Doctype(doctype) => {
                        out.push_str("<!DOCTYPE ");
                        out.push_str(doctype.name());
                        out.push('>');
                    }
                    _ => {}
                }
            }
            Edge::Close(current) => {
                match &skip {
                    Some(Skip::Whole(id)) => {
                        if *id == current.id() {
                            skip = None;
                        }
                        continue;
                    }
                    Some(Skip::Children(id)) => {
                        if *id != current.id() {
                            continue;
                        }
                        skip = None;
                    }
                    None => {}
                }

                if let Node::Element(element) = current.value() {
                    let node_edits = edits.get(current.id());
                    if node_edits.contains(&Edit::Unwrap) {
                        continue;
                    }
                    for edit in node_edits {
                        if let Edit::AppendHtml(html) = edit {
                            out.push_str(html);
                        }
                    }
                    let name = tag_name_for(element, node_edits);
                    if !VOID_ELEMENTS.contains(&name) {
                        out.push_str("</");
                        out.push_str(name);
                        out.push('>');
                    }
                }
            }
        }
    }
}

fn tag_name_for<'a>(element: &'a scraper::node::Element, edits: &'a [Edit]) -> &'a str {
    edits
        .iter()
        .rev()
        .find_map(|e| match e {
            Edit::Retag(tag) => Some(tag.as_str()),
            _ => None,
        })
        .unwrap_or_else(|| element.name())
}

fn write_start_tag(element: &scraper::node::Element, edits: &[Edit], out: &mut String) {
    let name = tag_name_for(element, edits);
    out.push('<');
    out.push_str(name);

    let overrides: Vec<(&str, &str)> = edits
        .iter()
        .filter_map(|e| match e {
            Edit::SetAttr(k, v) => Some((k.as_str(), v.as_str())),
            _ => None,
        })
        .collect();

    for (key, value) in element.attrs() {
        let value = overrides
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .unwrap_or(value);
        write_attr(key, value, out);
    }
    for (i, (key, value)) in overrides.iter().enumerate() {
        let already_written = element.attr(key).is_some();
        let overridden_later = overrides[i + 1..].iter().any(|(k, _)| k == key);
        if !already_written && !overridden_later {
            write_attr(key, value, out);
        }
    }
    out.push('>');
}

fn write_attr(key: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(value));
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <title>Test Page</title>
        </head>
        <body><h1>Heading</h1><p class="content">Paragraph 1</p><p class="content">Paragraph 2</p><a href="https://example.com">Link</a></body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML);
        assert_eq!(doc.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML);
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_element_attributes() {
        let doc = Document::parse(SAMPLE_HTML);
        let elements = doc.select("a").unwrap();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].attr("href"), Some("https://example.com"));
        assert_eq!(elements[0].text(), "Link");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML);
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(ColligoError::HtmlParseError(_))));
    }

    #[test]
    fn test_node_ids_follow_document_order() {
        let doc = Document::parse(SAMPLE_HTML);
        let paragraphs = doc.select("p").unwrap();
        assert!(paragraphs[0].id() < paragraphs[1].id());
        assert_eq!(doc.get(paragraphs[1].id()).unwrap().text(), "Paragraph 2");
    }

    #[test]
    fn test_body_html_round_trip() {
        let doc = Document::parse_fragment(r#"<p class="x" id="y">Tom &amp; Jerry <b>&lt;3</b></p><img src="a.png" alt="">"#);
        assert_eq!(
            doc.body_html(),
            r#"<p class="x" id="y">Tom &amp; Jerry <b>&lt;3</b></p><img src="a.png" alt="">"#
        );
    }

    #[test]
    fn test_render_with_edits() {
        let doc = Document::parse_fragment(r#"<div id="a"><span>one</span></div><div id="b">two</div><div id="c">three</div>"#);
        let a = doc.select("#a").unwrap()[0];
        let b = doc.select("#b").unwrap()[0];
        let c = doc.select("#c").unwrap()[0];

        let mut edits = Edits::new();
        edits.retag(a.id(), "p");
        edits.remove(b.id());
        edits.set_attr(c.id(), "data-x", "1");
        edits.append_html(c.id(), "<br>");

        assert_eq!(
            doc.render_body(&edits),
            r#"<p id="a"><span>one</span></p><div id="c" data-x="1">three<br></div>"#
        );
    }

    #[test]
    fn test_replace_and_unwrap() {
        let doc = Document::parse_fragment(r#"<table><tbody><tr><td>cell</td></tr></tbody></table><i>x</i>"#);
        let mut edits = Edits::new();
        for el in doc.select("table, tbody, tr, td").unwrap() {
            edits.unwrap(el.id());
        }
        let i = doc.select("i").unwrap()[0];
        edits.replace(i.id(), "<em>y</em>");

        assert_eq!(doc.render_body(&edits), "cell<em>y</em>");
    }

    #[test]
    fn test_set_inner_html_and_attribute_override() {
        let doc = Document::parse_fragment(r#"<img src="blank.gif" data-src="real.jpg"><div>old</div>"#);
        let img = doc.select("img").unwrap()[0];
        let div = doc.select("div").unwrap()[0];

        let mut edits = Edits::new();
        edits.set_attr(img.id(), "src", "real.jpg");
        edits.set_inner_html(div.id(), "new");

        assert_eq!(
            doc.render_body(&edits),
            r#"<img src="real.jpg" data-src="real.jpg"><div>new</div>"#
        );
    }

    #[test]
    fn test_noscript_text_is_raw() {
        let doc = Document::parse_fragment(r#"<noscript><img src="a.jpg"></noscript>"#);
        assert_eq!(doc.body_html(), r#"<noscript><img src="a.jpg"></noscript>"#);
    }

    #[test]
    fn test_fragment_keeps_leading_head_elements() {
        let html = r#"<link rel="stylesheet" href="a.css"><meta charset="utf-8"><p class="x">ad</p><p>keep</p>"#;
        let doc = Document::parse_fragment(html);
        let mut edits = Edits::new();
        edits.remove(doc.select("p.x").unwrap()[0].id());

        assert!(doc.is_fragment());
        assert_eq!(
            doc.render_body(&edits),
            r#"<link rel="stylesheet" href="a.css"><meta charset="utf-8"><p>keep</p>"#
        );
    }

    #[test]
    fn test_fragment_body_append() {
        let doc = Document::parse_fragment("<a>x</a>");
        let mut edits = Edits::new();
        let body = doc.body().unwrap();
        edits.append_html(body.id(), "<br>");
        assert_eq!(doc.render_body(&edits), "<a>x</a><br>");
    }

    #[test]
    fn test_text_len_with_skips_removed_subtrees() {
        let doc = Document::parse_fragment(r#"<div>abcd <a>ef</a><span class="x"><a>ghij</a></span></div>"#);
        let div = doc.select("div").unwrap()[0];
        assert_eq!(div.text_len_with(&Edits::new(), "a"), (11, 6));

        let mut edits = Edits::new();
        edits.remove(doc.select("span.x").unwrap()[0].id());
        assert_eq!(div.text_len_with(&edits, "a"), (7, 2));
    }

    #[test]
    fn test_siblings_and_self() {
        let doc = Document::parse_fragment(r#"<div><p>a</p>text<p>b</p><span>c</span></div>"#);
        let first = doc.select("p").unwrap()[0];
        let siblings = first.siblings_and_self();
        let tags: Vec<&str> = siblings.iter().map(|s| s.tag_name()).collect();
        assert_eq!(tags, vec!["p", "p", "span"]);
        assert!(first.parent().unwrap().has_own_text());
    }
}
