//! Renders a post or page into an ikiwiki `.mdwn` document: a block of
//! `[[!meta]]` directives, the (already rewritten) HTML body, and one
//! `[[!tag]]` directive per distinct category.

use crate::item::Item;
use crate::tag::tags;
use chrono::{Local, TimeZone};
use std::fmt;

/// The format of the `[[!meta date]]` value.
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Escapes a value for a double-quoted directive attribute. ikiwiki has no
/// escape sequence inside `"..."`, so embedded double quotes become single
/// quotes.
pub fn escape_attribute(value: &str) -> String {
    value.replace('"', "'")
}

/// Renders `item` with its date shown in the local time zone.
pub fn format_item(item: &Item) -> Result<String> {
    format_item_in(item, &Local)
}

/// Renders `item` with its date shown in `tz`.
///
/// A missing author or a missing date element is an error. A date element
/// that was present but could not be parsed only drops the date directive.
pub fn format_item_in<Tz>(item: &Item, tz: &Tz) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let author = item.author.as_deref().ok_or(Error::MissingField {
        post_id: item.post_id,
        field: "dc:creator",
    })?;
    let date = item.date.as_ref().ok_or(Error::MissingField {
        post_id: item.post_id,
        field: "wp:post_date_gmt",
    })?;

    let mut content = format!(
        "[[!meta  title=\"{}\"]]\n",
        escape_attribute(item.title_or_empty())
    );
    if let Some(utc) = date.utc {
        content.push_str(&format!(
            "[[!meta  date=\"{}\"]]\n",
            utc.with_timezone(tz).format(DATE_FORMAT)
        ));
    }
    content.push_str(&format!(
        "[[!meta  author=\"{}\"]]\n",
        escape_attribute(author)
    ));
    content.push_str(&item.body);

    let tags = tags(&item.categories);
    if !tags.is_empty() {
        content.push('\n');
        for tag in tags {
            content.push_str(&format!("\n[[!tag  {}]]", escape_attribute(&tag.name)));
        }
    }
    Ok(content)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem rendering an item.
#[derive(Debug)]
pub enum Error {
    /// Returned when an item lacks a field its document needs.
    MissingField { post_id: u64, field: &'static str },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingField { post_id, field } => {
                write!(f, "post {} is missing `{}`", post_id, field)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}
