//! Rewrite rule engine.
//!
//! A rule list (explicit per feed, or the predefined list for the entry's
//! domain) is tokenized into [`RawRule`]s, checked into [`RewriteRule`]s and
//! applied in order to an entry's content and title. Rewriting never fails:
//! a rule that cannot run is logged and skipped.
//!
//! # Example
//!
//! ```rust
//! use colligo_core::{Entry, RuleTables};
//! use colligo_core::rewrite::{RewriteConfig, Rewriter};
//!
//! let tables = RuleTables::new();
//! let rewriter = Rewriter::new(&tables, RewriteConfig::default());
//! let mut entry = Entry::new("https://example.org/a", "Title", "line one\nline two");
//! rewriter.rewrite("https://example.org/a", &mut entry, "nl2br");
//! assert_eq!(entry.content, "line one<br>line two");
//! ```

pub mod parser;
pub mod rules;
pub mod transforms;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::model::{Entry, Feed};
use crate::rules::{RuleTables, domain};

pub use parser::{RawRule, parse_rules};
pub use rules::{MissingArguments, RewriteRule};
pub use transforms::HnApp;

/// Default base URL for YouTube embeds.
pub const DEFAULT_YOUTUBE_EMBED_URL: &str = "https://www.youtube-nocookie.com/embed/";

/// Default Invidious instance for the Invidious player rule.
pub const DEFAULT_INVIDIOUS_INSTANCE: &str = "yewtu.be";

static URL_REWRITE_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"rewrite\("([^"]+)"\|"([^"]+)"\)"#).unwrap());

/// Settings for rules that embed third-party players.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteConfig {
    /// Base URL a YouTube video id is appended to
    pub youtube_embed_url: String,
    /// Host of the Invidious instance used by the Invidious player rule
    pub invidious_instance: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            youtube_embed_url: DEFAULT_YOUTUBE_EMBED_URL.to_string(),
            invidious_instance: DEFAULT_INVIDIOUS_INSTANCE.to_string(),
        }
    }
}

impl RewriteConfig {
    pub fn builder() -> RewriteConfigBuilder {
        RewriteConfigBuilder::default()
    }
}

/// Builder for [`RewriteConfig`]
#[derive(Debug, Default)]
pub struct RewriteConfigBuilder {
    config: RewriteConfig,
}

impl RewriteConfigBuilder {
    pub fn youtube_embed_url(mut self, url: impl Into<String>) -> Self {
        self.config.youtube_embed_url = url.into();
        self
    }

    pub fn invidious_instance(mut self, host: impl Into<String>) -> Self {
        self.config.invidious_instance = host.into();
        self
    }

    pub fn build(self) -> RewriteConfig {
        self.config
    }
}

/// Applies rewrite rules to entries.
///
/// Holds no per-entry state, so one rewriter can serve any number of entries.
#[derive(Debug, Clone)]
pub struct Rewriter<'a> {
    tables: &'a RuleTables,
    config: RewriteConfig,
}

impl<'a> Rewriter<'a> {
    pub fn new(tables: &'a RuleTables, config: RewriteConfig) -> Self {
        Self { tables, config }
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    /// The rules that apply to an entry, in order.
    ///
    /// A non-empty explicit list wins over the predefined list for the
    /// entry's domain. The PDF download link rule always comes last.
    pub fn resolve_rules(&self, entry_url: &str, explicit_rules: &str) -> Vec<RawRule> {
        let text = if !explicit_rules.is_empty() {
            explicit_rules
        } else {
            self.tables.rewrite_rules(&domain(entry_url)).unwrap_or_default()
        };

        let mut rules = parse_rules(text);
        rules.push(RawRule::new("add_pdf_download_link"));
        rules
    }

    /// Rewrite the entry's content and title in place.
    pub fn rewrite(&self, entry_url: &str, entry: &mut Entry, explicit_rules: &str) {
        for raw in self.resolve_rules(entry_url, explicit_rules) {
            match RewriteRule::try_from(&raw) {
                Ok(rule) => self.apply(&rule, entry_url, entry),
                Err(missing) => warn!(
                    rule = %missing.rule,
                    expected = missing.expected,
                    found = missing.found,
                    "Skipping rewrite rule with missing arguments"
                ),
            }
        }
    }

    /// Apply a single rule.
    pub fn apply(&self, rule: &RewriteRule, entry_url: &str, entry: &mut Entry) {
        let content = entry.content.as_str();
        let rewritten = match rule {
            RewriteRule::AddImageTitle => transforms::add_image_title(content),
            RewriteRule::AddMailtoSubject => transforms::add_mailto_subject(content),
            RewriteRule::AddDynamicImage => transforms::add_dynamic_image(content),
            RewriteRule::AddYoutubeVideo => {
                transforms::add_youtube_video(entry_url, content, &self.config.youtube_embed_url)
            }
            RewriteRule::AddYoutubeVideoUsingInvidiousPlayer => transforms::add_youtube_video_using_invidious_player(
                entry_url,
                content,
                &self.config.invidious_instance,
            ),
            RewriteRule::AddYoutubeVideoFromId => {
                transforms::add_youtube_video_from_id(content, &self.config.youtube_embed_url)
            }
            RewriteRule::AddInvidiousVideo => transforms::add_invidious_video(entry_url, content),
            RewriteRule::AddPdfDownloadLink => transforms::add_pdf_download_link(entry_url, content),
            RewriteRule::Nl2br => transforms::nl2br(content),
            RewriteRule::ConvertTextLinks => transforms::convert_text_links(content),
            RewriteRule::FixMediumImages => transforms::fix_medium_images(content),
            RewriteRule::UseNoscriptFigureImages => transforms::use_noscript_figure_images(content),
            RewriteRule::Replace { pattern, replacement } => {
                match transforms::replace_pattern(content, pattern, replacement) {
                    Ok(out) => out,
                    Err(e) => {
                        warn!(pattern = %pattern, error = %e, "Invalid pattern in replace rule");
                        return;
                    }
                }
            }
            RewriteRule::Remove { selector } => match transforms::remove_elements(content, selector) {
                Ok(out) => out,
                Err(e) => {
                    warn!(selector = %selector, error = %e, "Invalid selector in remove rule");
                    return;
                }
            },
            RewriteRule::Base64Decode { selector } => match transforms::base64_decode(content, selector) {
                Ok(out) => out,
                Err(e) => {
                    warn!(selector = %selector, error = %e, "Invalid selector in base64_decode rule");
                    return;
                }
            },
            RewriteRule::ParseMarkdown => transforms::parse_markdown(content),
            RewriteRule::RemoveTables => transforms::remove_tables(content),
            RewriteRule::AddHnLinksUsingHack => transforms::add_hn_links(content, HnApp::Hack),
            RewriteRule::AddHnLinksUsingOpener => transforms::add_hn_links(content, HnApp::Opener),
            RewriteRule::ReplaceTitle { pattern, replacement } => {
                match transforms::replace_pattern(&entry.title, pattern, replacement) {
                    Ok(title) => entry.title = title,
                    Err(e) => warn!(pattern = %pattern, error = %e, "Invalid pattern in replace_title rule"),
                }
                return;
            }
            RewriteRule::RemoveClickbait => {
                entry.title = transforms::remove_clickbait(&entry.title);
                return;
            }
            RewriteRule::Unknown(name) => {
                debug!(rule = %name, "Skipping unknown rewrite rule");
                return;
            }
        };

        entry.content = rewritten;
    }
}

/// The URL an entry should be scraped and rewritten under.
///
/// Applies the feed's `rewrite("pattern"|"replacement")` URL rule. Without a
/// rule, or when the rule or its pattern is malformed, the entry URL comes
/// back unchanged.
pub fn rewrite_entry_url(feed: &Feed, entry: &Entry) -> String {
    if feed.url_rewrite_rules.is_empty() {
        return entry.url.clone();
    }

    let Some(caps) = URL_REWRITE_RULE.captures(&feed.url_rewrite_rules) else {
        debug!(rule = %feed.url_rewrite_rules, "Cannot find search and replacement terms in URL rewrite rule");
        return entry.url.clone();
    };

    let (pattern, replacement) = (&caps[1], &caps[2]);
    match transforms::replace_pattern(&entry.url, pattern, replacement) {
        Ok(url) => {
            debug!(original = %entry.url, rewritten = %url, "Rewrote entry URL");
            url
        }
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "Invalid pattern in URL rewrite rule");
            entry.url.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(content: &str) -> Entry {
        Entry::new("https://example.org/post", "A Title", content)
    }

    #[test]
    fn test_pdf_rule_always_appended() {
        let tables = RuleTables::new();
        let rewriter = Rewriter::new(&tables, RewriteConfig::default());
        let mut entry = entry("body text");
        rewriter.rewrite("https://example.org/doc.pdf", &mut entry, "");
        assert_eq!(entry.content, r#"<a href="https://example.org/doc.pdf">PDF</a><br>body text"#);
    }

    #[test]
    fn test_explicit_rules_override_predefined() {
        let tables = RuleTables::new().with_rewrite_rules("example.org", "nl2br");
        let rewriter = Rewriter::new(&tables, RewriteConfig::default());

        let mut explicit = entry("a\nb");
        rewriter.rewrite("https://example.org/post", &mut explicit, "remove_clickbait");
        assert_eq!(explicit.content, "a\nb");

        let mut predefined = entry("a\nb");
        rewriter.rewrite("https://example.org/post", &mut predefined, "");
        assert_eq!(predefined.content, "a<br>b");
    }

    #[test]
    fn test_resolve_rules_without_match() {
        let tables = RuleTables::new();
        let rewriter = Rewriter::new(&tables, RewriteConfig::default());
        assert_eq!(rewriter.resolve_rules("https://unknown.example/", ""), vec![RawRule::new("add_pdf_download_link")]);
    }

    #[test]
    fn test_rules_apply_in_order() {
        let tables = RuleTables::new();
        let rewriter = Rewriter::new(&tables, RewriteConfig::default());
        let mut entry = entry("see https://example.org\nnext");
        rewriter.rewrite("https://example.org/post", &mut entry, "nl2br, convert_text_link");
        assert_eq!(entry.content, r#"see <a href="https://example.org">https://example.org</a><br>next"#);
    }

    #[test]
    fn test_bad_rules_are_skipped() {
        let tables = RuleTables::new();
        let rewriter = Rewriter::new(&tables, RewriteConfig::default());
        let mut entry = entry("<p>keep</p>");
        rewriter.rewrite(
            "https://example.org/post",
            &mut entry,
            r#"replace("("|"x"), remove("[["), replace("only"), no_such_rule"#,
        );
        assert_eq!(entry.content, "<p>keep</p>");
        assert_eq!(entry.title, "A Title");
    }

    #[test]
    fn test_title_rules() {
        let tables = RuleTables::new();
        let rewriter = Rewriter::new(&tables, RewriteConfig::default());
        let mut entry = entry("");
        entry.title = "BREAKING: THIS CHANGES EVERYTHING".to_string();
        rewriter.rewrite(
            "https://example.org/post",
            &mut entry,
            r#"replace_title("^BREAKING: "|""), remove_clickbait"#,
        );
        assert_eq!(entry.title, "This Changes Everything");
    }

    #[test]
    fn test_youtube_rule_uses_config() {
        let tables = RuleTables::predefined();
        let config = RewriteConfig::builder().youtube_embed_url("https://embed.example/").build();
        let rewriter = Rewriter::new(tables, config);
        let mut entry = entry("");
        rewriter.rewrite("https://www.youtube.com/watch?v=abc123", &mut entry, "");
        assert!(entry.content.contains(r#"src="https://embed.example/abc123""#));
    }

    #[test]
    fn test_rewrite_entry_url() {
        let feed = Feed {
            url_rewrite_rules: r#"rewrite("^https://example.org/(.*)$"|"https://mirror.example/$1")"#.to_string(),
            ..Default::default()
        };
        let entry = entry("");
        assert_eq!(rewrite_entry_url(&feed, &entry), "https://mirror.example/post");
    }

    #[test]
    fn test_rewrite_entry_url_malformed() {
        let entry = entry("");
        let no_rule = Feed::default();
        assert_eq!(rewrite_entry_url(&no_rule, &entry), entry.url);

        let garbage = Feed { url_rewrite_rules: "rewrite(oops)".to_string(), ..Default::default() };
        assert_eq!(rewrite_entry_url(&garbage, &entry), entry.url);

        let bad_regex = Feed { url_rewrite_rules: r#"rewrite("("|"x")"#.to_string(), ..Default::default() };
        assert_eq!(rewrite_entry_url(&bad_regex, &entry), entry.url);
    }
}
