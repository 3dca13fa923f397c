//! Tokenizer for rewrite rule lists.
//!
//! A rule list is a sequence of identifiers, each optionally followed by
//! double-quoted string arguments:
//!
//! ```text
//! add_dynamic_image, replace("a(.*).svg"|"a$1.png"), remove(".x, .y")
//! ```
//!
//! Every character that is neither part of an identifier nor of a string is
//! a separator, so `(`, `)`, `,` and `|` carry no meaning of their own.
//! Strings use the usual backslash escapes; a string that fails to decode
//! (bad escape, missing closing quote) still counts as an argument, with an
//! empty value.

use std::iter::Peekable;
use std::str::Chars;

/// A rule name with its decoded string arguments, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRule {
    pub name: String,
    pub args: Vec<String>,
}

impl RawRule {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), args: Vec::new() }
    }
}

/// Split a rule list into rules.
///
/// Strings seen before the first identifier have no rule to attach to and
/// are dropped.
pub fn parse_rules(text: &str) -> Vec<RawRule> {
    let mut rules: Vec<RawRule> = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if is_ident_start(c) {
            let name = scan_identifier(&mut chars);
            rules.push(RawRule { name, args: Vec::new() });
        } else if c == '"' {
            chars.next();
            let arg = scan_string(&mut chars).unwrap_or_default();
            if let Some(rule) = rules.last_mut() {
                rule.args.push(arg);
            }
        } else {
            chars.next();
        }
    }

    rules
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn scan_identifier(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_continue(c) {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

/// Scan a string body after its opening quote.
///
/// The whole literal is always consumed, up to the closing quote or the end
/// of the line, so a bad escape never desynchronizes the scanner. `None`
/// means the literal did not decode.
fn scan_string(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut bytes: Vec<u8> = Vec::new();
    let mut valid = true;

    loop {
        let Some(c) = chars.next() else {
            return None;
        };
        match c {
            '"' => break,
            '\n' => return None,
            '\\' => match decode_escape(chars) {
                Some(Escaped::Char(decoded)) => {
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(decoded.encode_utf8(&mut buf).as_bytes());
                }
                Some(Escaped::Byte(byte)) => bytes.push(byte),
                None => valid = false,
            },
            _ => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    if !valid {
        return None;
    }
    String::from_utf8(bytes).ok()
}

enum Escaped {
    Char(char),
    Byte(u8),
}

/// Decode one escape sequence after its backslash.
///
/// Consumes nothing past the escape, and never consumes the closing quote or
/// a newline when the escape is malformed.
fn decode_escape(chars: &mut Peekable<Chars<'_>>) -> Option<Escaped> {
    let c = *chars.peek()?;
    if c == '\n' {
        return None;
    }
    chars.next();

    let simple = match c {
        'a' => Some('\u{07}'),
        'b' => Some('\u{08}'),
        'f' => Some('\u{0C}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\u{0B}'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        _ => None,
    };
    if let Some(decoded) = simple {
        return Some(Escaped::Char(decoded));
    }

    match c {
        'x' => take_digits(chars, 2, 16).and_then(|v| u8::try_from(v).ok()).map(Escaped::Byte),
        'u' => take_digits(chars, 4, 16).and_then(char::from_u32).map(Escaped::Char),
        'U' => take_digits(chars, 8, 16).and_then(char::from_u32).map(Escaped::Char),
        '0'..='7' => {
            let first = c.to_digit(8)?;
            let rest = take_digits(chars, 2, 8)?;
            u8::try_from(first * 64 + rest).ok().map(Escaped::Byte)
        }
        _ => None,
    }
}

/// Read exactly `count` digits in `radix`, stopping early (without
/// consuming) at the first non-digit.
fn take_digits(chars: &mut Peekable<Chars<'_>>, count: usize, radix: u32) -> Option<u32> {
    let mut value: u32 = 0;
    for _ in 0..count {
        let digit = chars.peek().and_then(|c| c.to_digit(radix))?;
        chars.next();
        value = value * radix + digit;
    }
    Some(value)
}
