use std::sync::LazyLock;

use crate::rules::directives::Directive;

/// Compiled-in `domain → CSS selector` scraper rules.
const PREDEFINED_SCRAPER_RULES: &[(&str, &str)] = &[
    ("bbc.co.uk", "div.vxp-column--single, div.story-body__inner, ul.gallery-images__list"),
    ("blog.cloudflare.com", "div.post-content"),
    ("cbc.ca", ".story-content"),
    ("darioincalza.net", "div#article-content"),
    ("dev.to", "div#article-body"),
    ("developpez.com", "div[itemprop=articleBody]"),
    ("dilbert.com", "span.comic-title-name, img.img-comic"),
    ("explosm.net", "div#comic"),
    ("financialsamurai.com", "article"),
    ("francetvinfo.fr", ".text"),
    ("github.com", "article.entry-content"),
    ("heise.de", "header .article-content__lead, header .article-image, div.article-layout__content.article-content"),
    ("igen.fr", "section.corps"),
    ("ikiwiki.iki.fi", ".page.group"),
    ("ilpost.it", ".entry-content"),
    ("ing.dk", "section.body"),
    ("lapresse.ca", ".amorce, .entry"),
    ("lemonde.fr", "article"),
    ("lepoint.fr", ".art-text"),
    ("lesjoiesducode.fr", ".blog-post-content img"),
    ("lesnumeriques.com", ".text-introduction, #product-summary, .text-section"),
    ("linux.com", "div.content, div[property]"),
    ("mac4ever.com", "div[itemprop=articleBody]"),
    ("monwindows.com", ".blog-post-body"),
    ("npr.org", "#storytext"),
    ("oneindia.com", ".io-article-body"),
    ("opensource.com", "div[property]"),
    ("osnews.com", "div.newscontent1"),
    ("phoronix.com", "div.content"),
    ("pseudo-sciences.org", "#art_main"),
    ("quantamagazine.org", ".outer--content, figure, script"),
    ("raywenderlich.com", "article"),
    ("royalroad.com", ".author-note-portlet, .chapter-content"),
    ("slate.fr", ".field-items"),
    ("smbc-comics.com", "div#cc-comicbody, div#aftercomic"),
    ("swordscomic.com", "img#comic-image, div#info-frame.tab-content-area"),
    ("techcrunch.com", "div.article-entry"),
    ("theoatmeal.com", "div#comic"),
    ("theregister.com", "#top-col-story h2, #body"),
    ("theverge.com", "h2.duet--article--dangerously-set-cms-markup, figure.w-full, div.duet--article--article-body-component"),
    ("turnoff.us", "article.post-content"),
    ("universfreebox.com", "#corps_corps"),
    ("version2.dk", "section.body"),
    ("wdwnt.com", "div.entry-content"),
    ("webtoons.com", ".viewer_img, p.author_text"),
    ("wired.com", "main figure, article"),
    ("zdnet.com", "div.storyBody"),
    ("zeit.de", ".summary, .article-body"),
];

/// Compiled-in `domain → rewrite rule list` rules.
const PREDEFINED_REWRITE_RULES: &[(&str, &str)] = &[
    ("abstrusegoose.com", "add_image_title"),
    ("amazingsuperpowers.com", "add_image_title"),
    ("blog.cloudflare.com", r#"add_image_title, remove("figure.kg-image-card figure.kg-image + img")"#),
    ("blog.laravel.com", "parse_markdown"),
    ("cowbirdsinlove.com", "add_image_title"),
    ("drawingboardcomic.com", "add_image_title"),
    ("exocomics.com", "add_image_title"),
    ("framatube.org", "nl2br, convert_text_link"),
    ("happletea.com", "add_image_title"),
    (
        "ilpost.it",
        r#"remove(".art_tag, #audioPlayerArticle, .author-container, .caption, .ilpostShare, .lastRecents, #mc_embed_signup, .outbrain_inread, .youtube-overlay")"#,
    ),
    ("imogenquest.net", "add_image_title"),
    ("lukesurl.com", "add_image_title"),
    ("medium.com", "fix_medium_images"),
    ("mercworks.net", "add_image_title"),
    ("monkeyuser.com", "add_image_title"),
    ("mrlovenstein.com", "add_image_title"),
    ("nedroid.com", "add_image_title"),
    ("oglaf.com", r#"replace("media.oglaf.com/story/tt(.+).gif"|"media.oglaf.com/comic/$1.jpg"), add_image_title"#),
    ("optipess.com", "add_image_title"),
    ("peebleslab.com", "add_image_title"),
    (
        "quantamagazine.org",
        r##"add_youtube_video_from_id, remove("#comments, .next-post__content, .footer__section, figure .outer--content, script")"##,
    ),
    ("sentfromthemoon.com", "add_image_title"),
    ("thedoghousediaries.com", "add_image_title"),
    ("theverge.com", r#"add_dynamic_image, remove("div.duet--recirculation--related-list, .hidden")"#),
    ("treelobsters.com", "add_image_title"),
    ("webtoons.com", r#"add_dynamic_image, replace("webtoon"|"swebtoon")"#),
    ("www.qwantz.com", "add_image_title, add_mailto_subject"),
    ("www.recalbox.com", "parse_markdown"),
    ("xkcd.com", "add_image_title"),
    ("youtube.com", "add_youtube_video"),
];

static PREDEFINED: LazyLock<RuleTables> = LazyLock::new(|| RuleTables {
    scraper: PREDEFINED_SCRAPER_RULES.iter().map(|(d, s)| (d.to_string(), s.to_string())).collect(),
    rewrite: PREDEFINED_REWRITE_RULES.iter().map(|(d, r)| (d.to_string(), r.to_string())).collect(),
});

/// Per-domain scraper selectors and rewrite rule lists.
///
/// Lookups match a table domain as a case-sensitive substring of the host,
/// in declaration order; the first match wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTables {
    scraper: Vec<(String, String)>,
    rewrite: Vec<(String, String)>,
}

impl RuleTables {
    /// Create empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled-in tables, built once per process.
    pub fn predefined() -> &'static RuleTables {
        &PREDEFINED
    }

    pub fn with_scraper_rule(mut self, domain: &str, selector: &str) -> Self {
        self.scraper.push((domain.to_string(), selector.to_string()));
        self
    }

    pub fn with_rewrite_rules(mut self, domain: &str, rules: &str) -> Self {
        self.rewrite.push((domain.to_string(), rules.to_string()));
        self
    }

    /// Add a directive from a rules file
    pub fn add_directive(&mut self, directive: Directive) {
        match directive {
            Directive::Scraper { domain, selector } => self.scraper.push((domain, selector)),
            Directive::Rewrite { domain, rules } => self.rewrite.push((domain, rules)),
        }
    }

    /// Append another table set; entries already present keep precedence.
    pub fn merge(&mut self, other: &RuleTables) {
        self.scraper.extend(other.scraper.iter().cloned());
        self.rewrite.extend(other.rewrite.iter().cloned());
    }

    /// Selector for the first scraper entry whose domain occurs in `host`.
    pub fn scraper_rule(&self, host: &str) -> Option<&str> {
        lookup(&self.scraper, host)
    }

    /// Rule list for the first rewrite entry whose domain occurs in `host`.
    pub fn rewrite_rules(&self, host: &str) -> Option<&str> {
        lookup(&self.rewrite, host)
    }

    pub fn scraper_len(&self) -> usize {
        self.scraper.len()
    }

    pub fn rewrite_len(&self) -> usize {
        self.rewrite.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scraper.is_empty() && self.rewrite.is_empty()
    }
}

fn lookup<'a>(table: &'a [(String, String)], host: &str) -> Option<&'a str> {
    table.iter().find(|(domain, _)| host.contains(domain.as_str())).map(|(_, value)| value.as_str())
}

/// Host part of a URL; the input itself when it does not parse.
pub fn domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
