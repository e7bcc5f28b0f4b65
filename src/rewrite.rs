//! Rewrites WordPress attachment links into ikiwiki image directives.
//!
//! WordPress marks a linked image with `rel="attachment wp-att-<id>"` on the
//! surrounding anchor. Each such anchor that wraps an `<img>` and whose id
//! names a known attachment becomes `[[!img  <filename> ...]]`, pointing at
//! the attachment file written next to the post. Everything else is left as
//! it was, so running the rewrite again over its own output changes nothing.

use crate::format::escape_attribute;
use regex_lite::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// Matches `<a ... rel="attachment wp-att-<id>" ...>...</a>`.
static ATTACHMENT_ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<a\s[^>]*?rel\s*=\s*["']attachment wp-att-(\d+)["'][^>]*>(.*?)</a\s*>"#,
    )
    .unwrap()
});

/// Matches the first `<img ...>` tag.
static IMG_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\s[^>]*>").unwrap());

/// Matches `name="value"` and `name='value'` attributes.
static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Image attributes copied onto the directive when present.
const COPIED_ATTRIBUTES: [&str; 3] = ["title", "alt", "class"];

/// Rewrites the attachment anchors of `body`. `attachment_filename` maps a
/// post id to the file name of that attachment, or `None` when the id does
/// not name an exported attachment.
pub fn rewrite_image_links<'a, F>(body: &'a str, attachment_filename: F) -> Cow<'a, str>
where
    F: Fn(u64) -> Option<String>,
{
    ATTACHMENT_ANCHOR_RE.replace_all(body, |caps: &Captures| {
        let whole = caps[0].to_owned();
        let filename = match caps[1].parse::<u64>().ok().and_then(&attachment_filename) {
            Some(filename) => filename,
            None => return whole,
        };
        match IMG_TAG_RE.find(&caps[2]) {
            Some(img) => img_directive(&filename, img.as_str()),
            None => whole,
        }
    })
}

fn img_directive(filename: &str, img_tag: &str) -> String {
    let attribute = |name: &str| -> Option<String> {
        ATTRIBUTE_RE.captures_iter(img_tag).find_map(|caps| {
            if caps[1].eq_ignore_ascii_case(name) {
                caps.get(2)
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str().to_owned())
            } else {
                None
            }
        })
    };

    // ikiwiki splits unquoted parameters on whitespace.
    let mut directive = if filename.chars().any(char::is_whitespace) {
        format!("[[!img  \"{}\"", escape_attribute(filename))
    } else {
        format!("[[!img  {}", filename)
    };
    let (width, height) = (attribute("width"), attribute("height"));
    if width.is_some() || height.is_some() {
        directive.push_str(&format!(
            " size=\"{}x{}\"",
            escape_attribute(width.as_deref().unwrap_or_default()),
            escape_attribute(height.as_deref().unwrap_or_default())
        ));
    }
    for name in COPIED_ATTRIBUTES {
        if let Some(value) = attribute(name) {
            directive.push_str(&format!(" {}=\"{}\"", name, escape_attribute(&value)));
        }
    }
    directive.push_str("]]");
    directive
}
