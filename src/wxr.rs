//! Reads a WordPress export (WXR) document into typed [`Record`]s. This is
//! the only module that looks at XML; everything downstream works on the
//! typed records, so a missing or malformed required field fails here rather
//! than surfacing later as an absent value.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fmt;

/// One `<item>` of the export with its fields pulled out and typed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    /// `wp:post_id`.
    pub post_id: u64,

    /// `wp:post_parent`. Zero or absent means the record has no parent.
    pub parent_id: Option<u64>,

    /// `wp:post_type`, e.g. `post`, `page`, `attachment`, `revision`.
    pub post_type: String,

    /// `wp:status`, e.g. `publish`, `draft`, `inherit`.
    pub status: String,

    pub title: Option<String>,
    pub link: Option<String>,
    pub guid: Option<String>,

    /// `dc:creator`.
    pub creator: Option<String>,

    /// `content:encoded`. Empty when absent.
    pub content: String,

    /// `wp:post_date_gmt`, unparsed.
    pub date_gmt: Option<String>,

    /// `wp:attachment_url`.
    pub attachment_url: Option<String>,

    pub categories: Vec<Category>,

    /// `wp:postmeta` key/value pairs in document order.
    pub postmeta: Vec<(String, String)>,

    pub comments: Vec<CommentRecord>,
}

impl Record {
    /// Returns the value of the first postmeta entry named `key`.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.postmeta
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A `<category>` element of any domain (`category` or `post_tag`). WordPress
/// writes each category twice, once with a `nicename` attribute and once
/// without, so the nicename is what identifies a category.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Category {
    pub nicename: Option<String>,
    pub name: String,
}

/// A `<wp:comment>` element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommentRecord {
    /// `wp:comment_approved`; `"1"` for approved comments.
    pub approved: String,
    pub author: Option<String>,
    pub author_url: Option<String>,
    pub date_gmt: Option<String>,
    pub content: String,
}

/// Raw field values gathered for one item before they are typed.
#[derive(Default)]
struct PartialRecord {
    post_id: Option<String>,
    parent_id: Option<String>,
    post_type: Option<String>,
    status: Option<String>,
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    creator: Option<String>,
    content: Option<String>,
    date_gmt: Option<String>,
    attachment_url: Option<String>,
    categories: Vec<Category>,
    postmeta: Vec<(String, String)>,
    comments: Vec<CommentRecord>,
}

impl PartialRecord {
    fn set(&mut self, element: &[u8], text: String) {
        let slot = match element {
            b"wp:post_id" => &mut self.post_id,
            b"wp:post_parent" => &mut self.parent_id,
            b"wp:post_type" => &mut self.post_type,
            b"wp:status" => &mut self.status,
            b"title" => &mut self.title,
            b"link" => &mut self.link,
            b"guid" => &mut self.guid,
            b"dc:creator" => &mut self.creator,
            b"content:encoded" => &mut self.content,
            b"wp:post_date_gmt" => &mut self.date_gmt,
            b"wp:attachment_url" => &mut self.attachment_url,
            _ => return,
        };
        *slot = Some(text);
    }

    fn into_record(self, position: usize) -> Result<Record> {
        let post_id = parse_id(
            position,
            "wp:post_id",
            self.post_id
                .as_deref()
                .ok_or(Error::MissingField {
                    position,
                    field: "wp:post_id",
                })?,
        )?;
        let parent_id = match self.parent_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => match parse_id(position, "wp:post_parent", value)? {
                0 => None,
                id => Some(id),
            },
        };
        Ok(Record {
            post_id,
            parent_id,
            post_type: self.post_type.ok_or(Error::MissingField {
                position,
                field: "wp:post_type",
            })?,
            status: self.status.ok_or(Error::MissingField {
                position,
                field: "wp:status",
            })?,
            title: non_empty(self.title),
            link: non_empty(self.link),
            guid: non_empty(self.guid),
            creator: non_empty(self.creator),
            content: self.content.unwrap_or_default(),
            // Present but empty is an unparseable date, not a missing one.
            date_gmt: self.date_gmt,
            attachment_url: non_empty(self.attachment_url),
            categories: self.categories,
            postmeta: self.postmeta,
            comments: self.comments,
        })
    }
}

impl CommentRecord {
    fn set(&mut self, element: &[u8], text: String) {
        match element {
            b"wp:comment_approved" => self.approved = text,
            b"wp:comment_author" => self.author = Some(text),
            b"wp:comment_author_url" => self.author_url = Some(text),
            b"wp:comment_date_gmt" => self.date_gmt = Some(text),
            b"wp:comment_content" => self.content = text,
            _ => {}
        }
    }

    fn finish(mut self) -> CommentRecord {
        self.author = non_empty(self.author);
        self.author_url = non_empty(self.author_url);
        self.date_gmt = non_empty(self.date_gmt);
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_id(position: usize, field: &'static str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| Error::InvalidField {
        position,
        field,
        value: value.to_owned(),
    })
}

/// Where the reader currently is inside an `<item>`.
enum Scope {
    Item,
    Comment(CommentRecord),
    Meta {
        key: Option<String>,
        value: Option<String>,
    },
    Category { nicename: Option<String> },
}

/// Parses every `<item>` in `input` into a [`Record`], in document order.
pub fn parse(input: &[u8]) -> Result<Vec<Record>> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut records = Vec::new();
    let mut item: Option<PartialRecord> = None;
    let mut scope = Scope::Item;
    let mut text = String::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|err| Error::Xml {
            position: reader.buffer_position() as u64,
            err,
        })?;
        match event {
            Event::Start(e) => {
                text.clear();
                let name = e.name();
                match (name.as_ref(), item.is_some()) {
                    (b"item", _) => {
                        item = Some(PartialRecord::default());
                        scope = Scope::Item;
                    }
                    (b"wp:comment", true) => scope = Scope::Comment(CommentRecord::default()),
                    (b"wp:postmeta", true) => {
                        scope = Scope::Meta {
                            key: None,
                            value: None,
                        }
                    }
                    (b"category", true) => scope = category_scope(&e),
                    _ => {}
                }
            }
            Event::Empty(e) => {
                // An empty element is a field whose value is the empty string.
                if let Some(record) = item.as_mut() {
                    let name = e.name();
                    if name.as_ref() == b"category" {
                        if let Scope::Category { nicename } = category_scope(&e) {
                            record.categories.push(Category {
                                nicename,
                                name: String::new(),
                            });
                        }
                    } else {
                        close_field(record, &mut scope, name.as_ref(), String::new());
                    }
                }
            }
            Event::Text(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(&e);
                match resolve_entity(&entity) {
                    Some(c) => text.push(c),
                    None => {
                        text.push('&');
                        text.push_str(&entity);
                        text.push(';');
                    }
                }
            }
            Event::End(e) => {
                let name = e.name();
                if name.as_ref() == b"item" {
                    if let Some(record) = item.take() {
                        records.push(record.into_record(records.len())?);
                    }
                } else if let Some(record) = item.as_mut() {
                    let value = std::mem::take(&mut text);
                    close_field(record, &mut scope, name.as_ref(), value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

fn category_scope(e: &BytesStart) -> Scope {
    let nicename = e
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"nicename")
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned());
    Scope::Category { nicename }
}

/// Stores `value` for the element `name` that just closed, or folds the
/// current scope into the record when `name` closes that scope.
fn close_field(record: &mut PartialRecord, scope: &mut Scope, name: &[u8], value: String) {
    match scope {
        Scope::Comment(comment) => {
            if name == b"wp:comment" {
                if let Scope::Comment(comment) = std::mem::replace(scope, Scope::Item) {
                    record.comments.push(comment.finish());
                }
            } else {
                comment.set(name, value);
            }
        }
        Scope::Meta { key, value: meta } => match name {
            b"wp:meta_key" => *key = Some(value),
            b"wp:meta_value" => *meta = Some(value),
            b"wp:postmeta" => {
                if let Scope::Meta {
                    key: Some(key),
                    value,
                } = std::mem::replace(scope, Scope::Item)
                {
                    record.postmeta.push((key, value.unwrap_or_default()));
                }
            }
            _ => {}
        },
        Scope::Category { nicename } => {
            if name == b"category" {
                record.categories.push(Category {
                    nicename: nicename.take(),
                    name: value,
                });
                *scope = Scope::Item;
            }
        }
        Scope::Item => record.set(name, value),
    }
}

/// Resolves the predefined XML entities and character references.
fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "apos" => return Some('\''),
        "quot" => return Some('"'),
        "lt" => return Some('<'),
        "gt" => return Some('>'),
        "amp" => return Some('&'),
        _ => {}
    }
    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem reading the export document.
#[derive(Debug)]
pub enum Error {
    /// Returned when the document is not well-formed XML.
    Xml { position: u64, err: quick_xml::Error },

    /// Returned when an item lacks a field every item must have.
    MissingField {
        position: usize,
        field: &'static str,
    },

    /// Returned when a field holds a value of the wrong shape, e.g. a
    /// non-numeric post id.
    InvalidField {
        position: usize,
        field: &'static str,
        value: String,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Xml { position, err } => {
                write!(f, "malformed export at byte {}: {}", position, err)
            }
            Error::MissingField { position, field } => {
                write!(f, "item #{} is missing `{}`", position + 1, field)
            }
            Error::InvalidField {
                position,
                field,
                value,
            } => write!(
                f,
                "item #{} has an invalid `{}`: {:?}",
                position + 1,
                field,
                value
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Xml { err, .. } => Some(err),
            Error::MissingField { .. } => None,
            Error::InvalidField { .. } => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"
    xmlns:content="http://purl.org/rss/1.0/modules/content/"
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:wp="http://wordpress.org/export/1.0/">
<channel>
  <title>A Blog</title>
  <link>http://example.com</link>
  <item>
    <title>Fish &amp; Chips</title>
    <link>http://example.com/fish-%26-chips/</link>
    <guid isPermaLink="false">http://example.com/?p=7</guid>
    <dc:creator><![CDATA[alice]]></dc:creator>
    <content:encoded><![CDATA[<p>Body</p>]]></content:encoded>
    <category><![CDATA[Food]]></category>
    <category domain="category" nicename="food"><![CDATA[Food]]></category>
    <wp:post_id>7</wp:post_id>
    <wp:post_date_gmt>2010-05-01 12:00:00</wp:post_date_gmt>
    <wp:status>publish</wp:status>
    <wp:post_parent>0</wp:post_parent>
    <wp:post_type>post</wp:post_type>
    <wp:postmeta>
      <wp:meta_key>_edit_last</wp:meta_key>
      <wp:meta_value><![CDATA[1]]></wp:meta_value>
    </wp:postmeta>
    <wp:comment>
      <wp:comment_author><![CDATA[Bob]]></wp:comment_author>
      <wp:comment_author_url></wp:comment_author_url>
      <wp:comment_date_gmt>2010-05-02 08:30:00</wp:comment_date_gmt>
      <wp:comment_content><![CDATA[Nice.]]></wp:comment_content>
      <wp:comment_approved>1</wp:comment_approved>
    </wp:comment>
  </item>
  <item>
    <title>photo</title>
    <wp:post_id>8</wp:post_id>
    <wp:status>inherit</wp:status>
    <wp:post_parent>7</wp:post_parent>
    <wp:post_type>attachment</wp:post_type>
    <wp:attachment_url>http://example.com/files/2010/05/photo.jpg</wp:attachment_url>
    <wp:postmeta>
      <wp:meta_key>_wp_attached_file</wp:meta_key>
      <wp:meta_value><![CDATA[2010/05/photo.jpg]]></wp:meta_value>
    </wp:postmeta>
  </item>
</channel>
</rss>"#;

    #[test]
    fn test_parse_items() -> Result<()> {
        let records = parse(EXPORT.as_bytes())?;
        assert_eq!(2, records.len());

        let post = &records[0];
        assert_eq!(7, post.post_id);
        assert_eq!(None, post.parent_id);
        assert_eq!("post", post.post_type);
        assert_eq!("publish", post.status);
        assert_eq!(Some("Fish & Chips"), post.title.as_deref());
        assert_eq!(Some("http://example.com/?p=7"), post.guid.as_deref());
        assert_eq!(Some("alice"), post.creator.as_deref());
        assert_eq!("<p>Body</p>", post.content);
        assert_eq!(Some("2010-05-01 12:00:00"), post.date_gmt.as_deref());
        assert_eq!(
            vec![
                Category {
                    nicename: None,
                    name: String::from("Food"),
                },
                Category {
                    nicename: Some(String::from("food")),
                    name: String::from("Food"),
                },
            ],
            post.categories
        );
        assert_eq!(Some("1"), post.meta("_edit_last"));
        assert_eq!(
            vec![CommentRecord {
                approved: String::from("1"),
                author: Some(String::from("Bob")),
                author_url: None,
                date_gmt: Some(String::from("2010-05-02 08:30:00")),
                content: String::from("Nice."),
            }],
            post.comments
        );

        let attachment = &records[1];
        assert_eq!(Some(7), attachment.parent_id);
        assert_eq!(Some("2010/05/photo.jpg"), attachment.meta("_wp_attached_file"));
        assert_eq!(String::new(), attachment.content);
        Ok(())
    }

    #[test]
    fn test_channel_fields_are_not_items() -> Result<()> {
        let records = parse(EXPORT.as_bytes())?;
        assert!(records.iter().all(|r| r.title.as_deref() != Some("A Blog")));
        Ok(())
    }

    #[test]
    fn test_missing_post_id() {
        let input = "<rss><channel><item><wp:status>publish</wp:status>\
                     <wp:post_type>post</wp:post_type></item></channel></rss>";
        match parse(input.as_bytes()) {
            Err(Error::MissingField { field, .. }) => assert_eq!("wp:post_id", field),
            other => panic!("wanted missing field error; found {:?}", other),
        }
    }

    #[test]
    fn test_invalid_parent_id() {
        let input = "<rss><channel><item><wp:post_id>1</wp:post_id>\
                     <wp:post_parent>abc</wp:post_parent><wp:status>publish</wp:status>\
                     <wp:post_type>post</wp:post_type></item></channel></rss>";
        assert!(matches!(
            parse(input.as_bytes()),
            Err(Error::InvalidField {
                field: "wp:post_parent",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_date_is_kept() -> Result<()> {
        let input = "<rss><channel>\
                     <item><wp:post_id>1</wp:post_id><wp:status>publish</wp:status>\
                     <wp:post_type>post</wp:post_type>\
                     <wp:post_date_gmt></wp:post_date_gmt></item>\
                     <item><wp:post_id>2</wp:post_id><wp:status>publish</wp:status>\
                     <wp:post_type>post</wp:post_type><wp:post_date_gmt/></item>\
                     <item><wp:post_id>3</wp:post_id><wp:status>publish</wp:status>\
                     <wp:post_type>post</wp:post_type></item>\
                     </channel></rss>";
        let records = parse(input.as_bytes())?;
        assert_eq!(Some(""), records[0].date_gmt.as_deref());
        assert_eq!(Some(""), records[1].date_gmt.as_deref());
        assert_eq!(None, records[2].date_gmt);
        Ok(())
    }

    #[test]
    fn test_malformed_document() {
        let input = "<rss><channel><item><wp:post_id>1</wp:status></item></channel></rss>";
        assert!(matches!(parse(input.as_bytes()), Err(Error::Xml { .. })));
    }
}
