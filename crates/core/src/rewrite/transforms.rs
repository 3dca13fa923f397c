//! Content and title transforms behind each rewrite rule.
//!
//! DOM transforms parse the fragment, collect [`Edits`] and re-render the
//! body; when nothing matches they hand the input back untouched. The
//! remaining transforms are plain string or regex operations.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::Regex;
use scraper::Selector;

use crate::dom::{Document, Edits, parse_selector, stream_rewrite};
use crate::Result;
use crate::rewrite::rules::DEFAULT_BASE64_SELECTOR;

/// Lazy-load attributes holding the real image URL, most preferred first.
const DYNAMIC_SRC_ATTRIBUTES: &[&str] = &[
    "data-src",
    "data-original",
    "data-orig",
    "data-url",
    "data-orig-file",
    "data-large-file",
    "data-medium-file",
    "data-original-mos",
    "data-2000src",
    "data-1000src",
    "data-800src",
    "data-655src",
    "data-500src",
    "data-380src",
];

const DYNAMIC_SRCSET_ATTRIBUTES: &[&str] = &["data-srcset"];

const HN_PREFIX: &str = "https://news.ycombinator.com/";

static YOUTUBE_WATCH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"youtube\.com/watch\?v=(.*)$").unwrap());

static INVIDIOUS_WATCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(.*)/(?:watch\?v=|embed/)([a-zA-Z0-9_-]+)(?:\?.*)?").unwrap()
});

static YOUTUBE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"youtube_id"?\s*[:=]\s*"([a-zA-Z0-9_-]{11})""#).unwrap());

static TEXT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)(\bhttps?://[-A-Z0-9+&@#/%?=~_|!:,.;]*[-A-Z0-9+&@#/%=~_|])").unwrap()
});

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<img [^>]+>").unwrap());

static IMG_WITH_TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src][title]").unwrap());
static MAILTO_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"a[href^="mailto:"]"#).unwrap());
static IMG_OR_DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img, div").unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static NOSCRIPT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("noscript").unwrap());
static FIGURE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("figure").unwrap());
static MEDIUM_FIGURE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("figure.paragraph-image").unwrap());
static HN_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href^="https://news.ycombinator.com/"]"#).unwrap());

/// Parse `html`, let `edit` record changes, and render the result.
fn edit_fragment(html: &str, edit: impl FnOnce(&Document, &mut Edits)) -> String {
    let doc = Document::parse_fragment(html);
    let mut edits = Edits::new();
    edit(&doc, &mut edits);
    if edits.is_empty() { html.to_string() } else { doc.render_body(&edits) }
}

fn video_iframe(src: &str) -> String {
    format!(
        r#"<iframe width="650" height="350" frameborder="0" src="{}" allowfullscreen></iframe>"#,
        encode_double_quoted_attribute(src)
    )
}

/// Wrap titled images in a figure with the title as caption.
pub fn add_image_title(html: &str) -> String {
    edit_fragment(html, |doc, edits| {
        for img in doc.select_with(&IMG_WITH_TITLE) {
            let src = img.attr("src").unwrap_or_default();
            let alt = img.attr("alt").unwrap_or_default();
            let title = img.attr("title").unwrap_or_default();
            edits.replace(
                img.id(),
                format!(
                    r#"<figure><img src="{}" alt="{}"><figcaption>{}</figcaption></figure>"#,
                    encode_double_quoted_attribute(src),
                    encode_double_quoted_attribute(alt),
                    encode_text(title)
                ),
            );
        }
    })
}

/// Append ` [subject]` to mailto links that carry a subject.
pub fn add_mailto_subject(html: &str) -> String {
    edit_fragment(html, |doc, edits| {
        for link in doc.select_with(&MAILTO_LINK) {
            let Some(href) = link.attr("href") else {
                continue;
            };
            let Ok(mailto) = url::Url::parse(href) else {
                continue;
            };
            let subject = mailto.query_pairs().find(|(key, _)| key == "subject").map(|(_, value)| value);
            if let Some(subject) = subject
                && !subject.is_empty()
            {
                edits.append_html(link.id(), format!(" [{}]", encode_text(&subject)));
            }
        }
    })
}

/// Promote lazy-load attributes to `src`/`srcset`.
///
/// A `<div>` carrying one becomes an `<img>`. When no element carries one, a
/// `<noscript>` holding exactly one `<img>` tag is replaced by that tag.
pub fn add_dynamic_image(html: &str) -> String {
    edit_fragment(html, |doc, edits| {
        for el in doc.select_with(&IMG_OR_DIV) {
            let src = DYNAMIC_SRC_ATTRIBUTES.iter().find_map(|name| el.attr(name));
            let srcset = DYNAMIC_SRCSET_ATTRIBUTES.iter().find_map(|name| el.attr(name));
            if src.is_none() && srcset.is_none() {
                continue;
            }

            if el.is("img") {
                if let Some(src) = src {
                    edits.set_attr(el.id(), "src", src);
                }
                if let Some(srcset) = srcset {
                    edits.set_attr(el.id(), "srcset", srcset);
                }
            } else {
                let mut tag = String::from("<img");
                if let Some(src) = src {
                    tag.push_str(&format!(r#" src="{}""#, encode_double_quoted_attribute(src)));
                }
                if let Some(srcset) = srcset {
                    tag.push_str(&format!(r#" srcset="{}""#, encode_double_quoted_attribute(srcset)));
                }
                let alt = el.attr("alt").unwrap_or_default();
                tag.push_str(&format!(r#" alt="{}">"#, encode_double_quoted_attribute(alt)));
                edits.replace(el.id(), tag);
            }
        }

        if !edits.is_empty() {
            return;
        }

        for noscript in doc.select_with(&NOSCRIPT) {
            let text = noscript.text();
            let mut tags = IMG_TAG.find_iter(&text);
            if let (Some(tag), None) = (tags.next(), tags.next()) {
                edits.replace(noscript.id(), tag.as_str());
            }
        }
    })
}

/// Prepend a YouTube embed when the entry URL is a watch page.
pub fn add_youtube_video(entry_url: &str, content: &str, embed_url: &str) -> String {
    match YOUTUBE_WATCH.captures(entry_url) {
        Some(caps) => format!("{}<br>{}", video_iframe(&format!("{}{}", embed_url, &caps[1])), content),
        None => content.to_string(),
    }
}

/// Prepend an Invidious player embed when the entry URL is a YouTube watch page.
pub fn add_youtube_video_using_invidious_player(entry_url: &str, content: &str, instance: &str) -> String {
    match YOUTUBE_WATCH.captures(entry_url) {
        Some(caps) => {
            let src = format!("https://{}/embed/{}", instance, &caps[1]);
            format!("{}<br>{}", video_iframe(&src), content)
        }
        None => content.to_string(),
    }
}

/// Prepend an embed from the Invidious instance the entry URL points at.
pub fn add_invidious_video(entry_url: &str, content: &str) -> String {
    match INVIDIOUS_WATCH.captures(entry_url) {
        Some(caps) => {
            let src = format!("https://{}/embed/{}", &caps[1], &caps[2]);
            format!("{}<br>{}", video_iframe(&src), content)
        }
        None => content.to_string(),
    }
}

/// Prepend one embed per `youtube_id` assignment found in the content.
pub fn add_youtube_video_from_id(content: &str, embed_url: &str) -> String {
    let mut out = String::new();
    for caps in YOUTUBE_ID.captures_iter(content) {
        out.push_str(&video_iframe(&format!("{}{}", embed_url, &caps[1])));
        out.push_str("<br>");
    }
    out.push_str(content);
    out
}

/// Prepend a download link when the entry URL names a PDF.
pub fn add_pdf_download_link(entry_url: &str, content: &str) -> String {
    if entry_url.ends_with(".pdf") {
        format!(r#"<a href="{}">PDF</a><br>{}"#, encode_double_quoted_attribute(entry_url), content)
    } else {
        content.to_string()
    }
}

pub fn nl2br(content: &str) -> String {
    content.replace('\n', "<br>")
}

/// Turn bare http(s) URLs into anchors.
pub fn convert_text_links(content: &str) -> String {
    TEXT_LINK.replace_all(content, r#"<a href="${1}">${1}</a>"#).into_owned()
}

/// Replace Medium's lazy image figures with their `<noscript>` markup.
pub fn fix_medium_images(html: &str) -> String {
    edit_fragment(html, |doc, edits| {
        for figure in doc.select_with(&MEDIUM_FIGURE) {
            if let Some(noscript) = figure.select_with(&NOSCRIPT).first() {
                edits.replace(figure.id(), noscript.text());
            }
        }
    })
}

/// Swap placeholder images in figures for the markup in the figure's `<noscript>`.
pub fn use_noscript_figure_images(html: &str) -> String {
    edit_fragment(html, |doc, edits| {
        for figure in doc.select_with(&FIGURE) {
            let images = figure.select_with(&IMG);
            let noscripts = figure.select_with(&NOSCRIPT);
            let Some((first, rest)) = images.split_first() else {
                continue;
            };
            if noscripts.is_empty() {
                continue;
            }

            let markup: String = noscripts.iter().map(|n| n.text()).collect();
            edits.replace(first.id(), markup);
            for img in rest {
                edits.remove(img.id());
            }
            for noscript in &noscripts {
                edits.remove(noscript.id());
            }
        }
    })
}

/// Regex search and replace with `$1`/`${name}` substitution.
pub fn replace_pattern(text: &str, pattern: &str, replacement: &str) -> std::result::Result<String, regex::Error> {
    let re = Regex::new(pattern)?;
    Ok(re.replace_all(text, replacement).into_owned())
}

/// Drop every element matching `selector`.
pub fn remove_elements(html: &str, selector: &str) -> Result<String> {
    let selector = parse_selector(selector)?;
    Ok(edit_fragment(html, |doc, edits| {
        for el in doc.select_with(&selector) {
            edits.remove(el.id());
        }
    }))
}

/// Decode base64 text nodes under every element matching `selector`.
///
/// Text that is not valid base64 of UTF-8 text is left alone; decoded text
/// is escaped before it is written back.
pub fn base64_decode(html: &str, selector: &str) -> Result<String> {
    let whole_fragment = selector.trim() == DEFAULT_BASE64_SELECTOR;
    let selector = parse_selector(selector)?;
    Ok(edit_fragment(html, |doc, edits| {
        let targets = if whole_fragment { doc.body().into_iter().collect() } else { doc.select_with(&selector) };
        for el in targets {
            for (id, text) in el.text_nodes() {
                if let Some(decoded) = decode_base64_text(text) {
                    edits.replace(id, encode_text(&decoded).into_owned());
                }
            }
        }
    }))
}

fn decode_base64_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let bytes = STANDARD.decode(trimmed).ok()?;
    String::from_utf8(bytes).ok()
}

/// Render Markdown content as HTML.
#[cfg(feature = "markdown")]
pub fn parse_markdown(content: &str) -> String {
    use pulldown_cmark::{Options, Parser, html};

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(content, options));
    out
}

#[cfg(not(feature = "markdown"))]
pub fn parse_markdown(content: &str) -> String {
    tracing::debug!("Markdown support not compiled in, leaving content unchanged");
    content.to_string()
}

/// Unwrap table markup, keeping the cell contents in place.
pub fn remove_tables(html: &str) -> String {
    let settings = lol_html::Settings {
        element_content_handlers: vec![lol_html::element!("table, caption, thead, tbody, tfoot, tr, th, td", |el| {
            el.remove_and_keep_content();
            Ok(())
        })],
        ..Default::default()
    };

    stream_rewrite(html, settings).unwrap_or_else(|| html.to_string())
}

/// Lowercase every word of a title after its first character.
pub fn remove_clickbait(title: &str) -> String {
    title
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => std::iter::once(first).chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// App that Hacker News links are offered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HnApp {
    Hack,
    Opener,
}

/// Add an "Open with ..." link next to each Hacker News link.
pub fn add_hn_links(html: &str, app: HnApp) -> String {
    edit_fragment(html, |doc, edits| {
        for link in doc.select_with(&HN_LINK) {
            let Some(href) = link.attr("href") else {
                continue;
            };
            let Ok(item) = url::Url::parse(href) else {
                continue;
            };
            let Some(parent) = link.parent() else {
                continue;
            };

            let anchor = match app {
                HnApp::Hack => {
                    let target = item.as_str().replacen(HN_PREFIX, "hack://", 1);
                    format!(r#" <a href="{}">Open with HACK</a>"#, encode_double_quoted_attribute(&target))
                }
                HnApp::Opener => {
                    let encoded: String = url::form_urlencoded::byte_serialize(item.as_str().as_bytes()).collect();
                    let target = format!("opener://x-callback-url/show-options?url={}", encoded);
                    format!(r#" <a href="{}">Open with Opener</a>"#, encode_double_quoted_attribute(&target))
                }
            };
            edits.append_html(parent.id(), anchor);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EMBED: &str = "https://www.youtube-nocookie.com/embed/";

    #[test]
    fn test_add_image_title() {
        let html = r#"<p><img src="comic.png" alt="Comic" title="Tom &amp; Jerry <3"></p>"#;
        assert_eq!(
            add_image_title(html),
            r#"<p><figure><img src="comic.png" alt="Comic"><figcaption>Tom &amp; Jerry &lt;3</figcaption></figure></p>"#
        );
    }

    #[test]
    fn test_add_image_title_without_title_is_unchanged() {
        let html = r#"<p><img src="comic.png"></p>"#;
        assert_eq!(add_image_title(html), html);
    }

    #[test]
    fn test_add_mailto_subject() {
        let html = r#"<a href="mailto:ryan@example.org?subject=Hello%20there">Mail me</a>"#;
        assert_eq!(
            add_mailto_subject(html),
            r#"<a href="mailto:ryan@example.org?subject=Hello%20there">Mail me [Hello there]</a>"#
        );
    }

    #[test]
    fn test_add_mailto_subject_without_subject() {
        let html = r#"<a href="mailto:ryan@example.org">Mail me</a>"#;
        assert_eq!(add_mailto_subject(html), html);
    }

    #[test]
    fn test_add_dynamic_image_priority() {
        let html = r#"<img data-380src="small.jpg" data-src="big.jpg">"#;
        assert_eq!(add_dynamic_image(html), r#"<img data-380src="small.jpg" data-src="big.jpg" src="big.jpg">"#);
    }

    #[test]
    fn test_add_dynamic_image_converts_div() {
        let html = r#"<div data-src="photo.jpg" alt="A photo"></div>"#;
        assert_eq!(add_dynamic_image(html), r#"<img src="photo.jpg" alt="A photo">"#);
    }

    #[test]
    fn test_add_dynamic_image_srcset() {
        let html = r#"<img src="blank.gif" data-srcset="a.jpg 1x, b.jpg 2x">"#;
        assert_eq!(add_dynamic_image(html), r#"<img src="blank.gif" data-srcset="a.jpg 1x, b.jpg 2x" srcset="a.jpg 1x, b.jpg 2x">"#);
    }

    #[test]
    fn test_add_dynamic_image_noscript_fallback() {
        let html = r#"<p>Intro</p><noscript><img src="real.jpg" alt="x"></noscript>"#;
        assert_eq!(add_dynamic_image(html), r#"<p>Intro</p><img src="real.jpg" alt="x">"#);
    }

    #[test]
    fn test_add_dynamic_image_leading_noscript() {
        let html = r#"<noscript><img src="real.jpg"></noscript><p>Text</p>"#;
        assert_eq!(add_dynamic_image(html), r#"<img src="real.jpg"><p>Text</p>"#);
    }

    #[test]
    fn test_add_dynamic_image_ignores_ambiguous_noscript() {
        let html = r#"<noscript><img src="a.jpg"><img src="b.jpg"></noscript>"#;
        assert_eq!(add_dynamic_image(html), html);
    }

    #[test]
    fn test_add_youtube_video() {
        let out = add_youtube_video("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "<p>desc</p>", EMBED);
        assert_eq!(
            out,
            r#"<iframe width="650" height="350" frameborder="0" src="https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ" allowfullscreen></iframe><br><p>desc</p>"#
        );
        assert_eq!(add_youtube_video("https://example.org/watch?v=1", "x", EMBED), "x");
    }

    #[test]
    fn test_add_youtube_video_using_invidious_player() {
        let out = add_youtube_video_using_invidious_player("https://www.youtube.com/watch?v=abc", "", "yewtu.be");
        assert!(out.contains(r#"src="https://yewtu.be/embed/abc""#));
        assert!(out.ends_with("<br>"));
    }

    #[test]
    fn test_add_invidious_video() {
        let out = add_invidious_video("https://invidious.example/watch?v=dQw4w9WgXcQ&t=5", "body");
        assert!(out.starts_with(r#"<iframe width="650" height="350" frameborder="0" src="https://invidious.example/embed/dQw4w9WgXcQ""#));
        assert!(out.ends_with("<br>body"));
    }

    #[test]
    fn test_add_youtube_video_from_id() {
        let content = r#"<script>var youtube_id = "dQw4w9WgXcQ";</script><p>text</p>"#;
        let out = add_youtube_video_from_id(content, EMBED);
        assert!(out.starts_with(r#"<iframe width="650" height="350" frameborder="0" src="https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ""#));
        assert!(out.ends_with(content));
        assert_eq!(add_youtube_video_from_id("<p>none</p>", EMBED), "<p>none</p>");
    }

    #[test]
    fn test_add_pdf_download_link() {
        assert_eq!(
            add_pdf_download_link("https://example.org/doc.pdf", "body text"),
            r#"<a href="https://example.org/doc.pdf">PDF</a><br>body text"#
        );
        assert_eq!(add_pdf_download_link("https://example.org/doc.html", "body text"), "body text");
    }

    #[test]
    fn test_nl2br() {
        assert_eq!(nl2br("a\nb\n"), "a<br>b<br>");
    }

    #[test]
    fn test_convert_text_links() {
        assert_eq!(
            convert_text_links("see https://example.org/a?b=1. Done"),
            r#"see <a href="https://example.org/a?b=1">https://example.org/a?b=1</a>. Done"#
        );
    }

    #[test]
    fn test_fix_medium_images() {
        let html = r#"<figure class="paragraph-image"><img src="tiny.jpg"><noscript><img src="full.jpg"></noscript></figure>"#;
        assert_eq!(fix_medium_images(html), r#"<img src="full.jpg">"#);
    }

    #[test]
    fn test_use_noscript_figure_images() {
        let html = r#"<figure><img src="placeholder.gif"><noscript><img src="real.jpg"></noscript><figcaption>Cap</figcaption></figure>"#;
        assert_eq!(
            use_noscript_figure_images(html),
            r#"<figure><img src="real.jpg"><figcaption>Cap</figcaption></figure>"#
        );
    }

    #[test]
    fn test_replace_pattern() {
        assert_eq!(
            replace_pattern(r#"<img src="a12.svg">"#, "a(.*).svg", "a$1.png").unwrap(),
            r#"<img src="a12.png">"#
        );
        assert!(replace_pattern("x", "(", "y").is_err());
    }

    #[test]
    fn test_remove_elements() {
        let html = r#"<p>Keep</p><div class="x">Ad</div><span class="y">Share</span>"#;
        assert_eq!(remove_elements(html, ".x, .y").unwrap(), "<p>Keep</p>");
        assert!(remove_elements(html, "[[").is_err());
    }

    #[test]
    fn test_remove_elements_keeps_leading_noscript() {
        let html = r#"<noscript><img src="real.jpg"></noscript><p class="x">ad</p><p>keep</p>"#;
        assert_eq!(remove_elements(html, ".x").unwrap(), r#"<noscript><img src="real.jpg"></noscript><p>keep</p>"#);
    }

    #[test]
    fn test_remove_elements_keeps_leading_link() {
        let html = r#"<link rel="stylesheet" href="a.css"><meta charset="utf-8"><p class="x">ad</p><p>keep</p>"#;
        assert_eq!(
            remove_elements(html, ".x").unwrap(),
            r#"<link rel="stylesheet" href="a.css"><meta charset="utf-8"><p>keep</p>"#
        );
    }

    #[test]
    fn test_base64_decode() {
        let html = "<p>SGVsbG8gPGI+d29ybGQ8L2I+</p><p>not base64!</p>";
        assert_eq!(
            base64_decode(html, "body").unwrap(),
            "<p>Hello &lt;b&gt;world&lt;/b&gt;</p><p>not base64!</p>"
        );
    }

    #[test]
    fn test_base64_decode_scoped_selector() {
        let html = r#"<p class="enc">aGk=</p><p>aGk=</p>"#;
        assert_eq!(base64_decode(html, ".enc").unwrap(), r#"<p class="enc">hi</p><p>aGk=</p>"#);
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn test_parse_markdown() {
        let out = parse_markdown("# Title\n\nSome *emphasis* and ~~strike~~.\n");
        assert!(out.contains("<h1>Title</h1>"));
        assert!(out.contains("<em>emphasis</em>"));
        assert!(out.contains("<del>strike</del>"));
    }

    #[test]
    fn test_remove_tables() {
        let html = "<table><tbody><tr><td><p>One</p></td><td>Two</td></tr></tbody></table>";
        assert_eq!(remove_tables(html), "<p>One</p>Two");
    }

    #[test]
    fn test_remove_clickbait() {
        assert_eq!(remove_clickbait("YOU WON'T BELIEVE  THIS"), "You Won't Believe This");
        assert_eq!(remove_clickbait("a I"), "a I");
    }

    #[test]
    fn test_add_hn_links_using_hack() {
        let html = r#"<p><a href="https://news.ycombinator.com/item?id=1">Comments</a></p>"#;
        assert_eq!(
            add_hn_links(html, HnApp::Hack),
            r#"<p><a href="https://news.ycombinator.com/item?id=1">Comments</a> <a href="hack://item?id=1">Open with HACK</a></p>"#
        );
    }

    #[test]
    fn test_add_hn_links_using_opener() {
        let html = r#"<p><a href="https://news.ycombinator.com/item?id=1">Comments</a></p>"#;
        let out = add_hn_links(html, HnApp::Opener);
        assert!(out.contains(
            r#"<a href="opener://x-callback-url/show-options?url=https%3A%2F%2Fnews.ycombinator.com%2Fitem%3Fid%3D1">Open with Opener</a>"#
        ));
    }
}
