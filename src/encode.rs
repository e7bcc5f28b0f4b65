//! Text payload encoding. Payloads are UTF-8 by default; [`Encoding::Ascii`]
//! replaces every non-ASCII character with an HTML character reference for
//! consumers that cannot take UTF-8.

use std::borrow::Cow;

/// How text payloads are encoded before they are written to the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Ascii,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Utf8
    }
}

impl Encoding {
    /// Encodes `text` into payload bytes.
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, [u8]> {
        match self {
            Encoding::Utf8 => Cow::Borrowed(text.as_bytes()),
            Encoding::Ascii if text.is_ascii() => Cow::Borrowed(text.as_bytes()),
            Encoding::Ascii => Cow::Owned(ascii_with_references(text).into_bytes()),
        }
    }
}

fn ascii_with_references(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            match entity_name(c) {
                Some(name) => {
                    out.push('&');
                    out.push_str(name);
                    out.push(';');
                }
                None => out.push_str(&format!("&#{};", c as u32)),
            }
        }
    }
    out
}

fn entity_name(c: char) -> Option<&'static str> {
    Some(match c {
        '\u{a0}' => "nbsp",
        '\u{a9}' => "copy",
        '\u{ae}' => "reg",
        '\u{b0}' => "deg",
        '\u{e0}' => "agrave",
        '\u{e1}' => "aacute",
        '\u{e4}' => "auml",
        '\u{e7}' => "ccedil",
        '\u{e8}' => "egrave",
        '\u{e9}' => "eacute",
        '\u{f6}' => "ouml",
        '\u{fc}' => "uuml",
        '\u{df}' => "szlig",
        '\u{2013}' => "ndash",
        '\u{2014}' => "mdash",
        '\u{2018}' => "lsquo",
        '\u{2019}' => "rsquo",
        '\u{201c}' => "ldquo",
        '\u{201d}' => "rdquo",
        '\u{2026}' => "hellip",
        '\u{20ac}' => "euro",
        _ => return None,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_utf8_passes_through() {
        let text = "café – naïve";
        assert_eq!(text.as_bytes(), &*Encoding::Utf8.encode(text));
    }

    #[test]
    fn test_ascii_uses_named_then_numeric_references() {
        let encoded = Encoding::Ascii.encode("café – ☃");
        assert_eq!(b"caf&eacute; &ndash; &#9731;", &*encoded);
    }

    #[test]
    fn test_ascii_borrows_plain_text() {
        assert!(matches!(Encoding::Ascii.encode("plain"), Cow::Borrowed(_)));
    }
}
