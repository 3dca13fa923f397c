use crate::error::{ColligoError, Result};

/// A single line of a rules file.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// `scraper(<domain>): <css selector>`
    Scraper { domain: String, selector: String },
    /// `rewrite(<domain>): <rewrite rule list>`
    Rewrite { domain: String, rules: String },
}

/// Parse a directive line.
///
/// The domain sits between the parentheses and may itself contain `:` (ports).
pub fn parse_directive(line: &str) -> Result<Directive> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Err(ColligoError::RuleConfigError("Empty or comment line".to_string()));
    }

    let (kind, rest) = line
        .split_once('(')
        .ok_or_else(|| ColligoError::RuleConfigError(format!("Expected `name(domain): value`, got: {}", line)))?;
    let (domain, value) = rest
        .split_once(')')
        .ok_or_else(|| ColligoError::RuleConfigError(format!("Unclosed domain in: {}", line)))?;
    let value = value
        .trim_start()
        .strip_prefix(':')
        .ok_or_else(|| ColligoError::RuleConfigError(format!("Missing `:` after domain in: {}", line)))?
        .trim();

    let domain = domain.trim();
    if domain.is_empty() {
        return Err(ColligoError::RuleConfigError(format!("Empty domain in: {}", line)));
    }
    if value.is_empty() {
        return Err(ColligoError::RuleConfigError(format!("Empty value for {}", domain)));
    }

    match kind.trim() {
        "scraper" => Ok(Directive::Scraper { domain: domain.to_string(), selector: value.to_string() }),
        "rewrite" => Ok(Directive::Rewrite { domain: domain.to_string(), rules: value.to_string() }),
        other => Err(ColligoError::RuleConfigError(format!("Unknown directive: {}", other))),
    }
}
