use crate::rewrite::parser::RawRule;

/// Selector `base64_decode` applies to when given no argument.
pub const DEFAULT_BASE64_SELECTOR: &str = "body";

/// A recognised rewrite rule with its arguments checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteRule {
    AddImageTitle,
    AddMailtoSubject,
    AddDynamicImage,
    AddYoutubeVideo,
    AddYoutubeVideoUsingInvidiousPlayer,
    AddYoutubeVideoFromId,
    AddInvidiousVideo,
    AddPdfDownloadLink,
    Nl2br,
    ConvertTextLinks,
    FixMediumImages,
    UseNoscriptFigureImages,
    /// Regex replace over the content
    Replace { pattern: String, replacement: String },
    /// Regex replace over the title
    ReplaceTitle { pattern: String, replacement: String },
    /// Drop every element matching the selector
    Remove { selector: String },
    /// Decode base64 text under the selector
    Base64Decode { selector: String },
    ParseMarkdown,
    RemoveTables,
    RemoveClickbait,
    AddHnLinksUsingHack,
    AddHnLinksUsingOpener,
    /// Unrecognised name; applying it does nothing
    Unknown(String),
}

/// A known rule written without the arguments it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingArguments {
    pub rule: String,
    pub expected: usize,
    pub found: usize,
}

impl TryFrom<&RawRule> for RewriteRule {
    type Error = MissingArguments;

    fn try_from(raw: &RawRule) -> Result<Self, Self::Error> {
        let args = &raw.args;
        let require = |expected: usize| {
            if args.len() < expected {
                Err(MissingArguments { rule: raw.name.clone(), expected, found: args.len() })
            } else {
                Ok(())
            }
        };

        let rule = match raw.name.as_str() {
            "add_image_title" => Self::AddImageTitle,
            "add_mailto_subject" => Self::AddMailtoSubject,
            "add_dynamic_image" => Self::AddDynamicImage,
            "add_youtube_video" => Self::AddYoutubeVideo,
            "add_youtube_video_using_invidious_player" => Self::AddYoutubeVideoUsingInvidiousPlayer,
            "add_youtube_video_from_id" => Self::AddYoutubeVideoFromId,
            "add_invidious_video" => Self::AddInvidiousVideo,
            "add_pdf_download_link" => Self::AddPdfDownloadLink,
            "nl2br" => Self::Nl2br,
            "convert_text_link" | "convert_text_links" => Self::ConvertTextLinks,
            "fix_medium_images" => Self::FixMediumImages,
            "use_noscript_figure_images" => Self::UseNoscriptFigureImages,
            "replace" => {
                require(2)?;
                Self::Replace { pattern: args[0].clone(), replacement: args[1].clone() }
            }
            "replace_title" => {
                require(2)?;
                Self::ReplaceTitle { pattern: args[0].clone(), replacement: args[1].clone() }
            }
            "remove" => {
                require(1)?;
                Self::Remove { selector: args[0].clone() }
            }
            "base64_decode" => Self::Base64Decode {
                selector: args.first().cloned().unwrap_or_else(|| DEFAULT_BASE64_SELECTOR.to_string()),
            },
            "parse_markdown" => Self::ParseMarkdown,
            "remove_tables" => Self::RemoveTables,
            "remove_clickbait" => Self::RemoveClickbait,
            "add_hn_links_using_hack" => Self::AddHnLinksUsingHack,
            "add_hn_links_using_opener" => Self::AddHnLinksUsingOpener,
            other => Self::Unknown(other.to_string()),
        };
        Ok(rule)
    }
}

impl RewriteRule {
    /// Whether the rule rewrites the title rather than the content.
    pub fn targets_title(&self) -> bool {
        matches!(self, Self::ReplaceTitle { .. } | Self::RemoveClickbait)
    }
}
