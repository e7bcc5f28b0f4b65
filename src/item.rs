//! Defines the [`Item`] type, the in-memory form of one exported post, page,
//! or attachment, and its construction from a [`Record`].

use crate::stub::stub;
use crate::wxr::{Category, CommentRecord, Record};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use percent_encoding::percent_decode_str;
use std::fmt;
use tracing::{debug, warn};

/// The date format WordPress uses for `*_date_gmt` fields.
pub const GMT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The postmeta key under which WordPress stores an attachment's path
/// relative to the uploads directory.
pub const ATTACHED_FILE_KEY: &str = "_wp_attached_file";

/// The kinds of records that are turned into files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostType {
    Post,
    Page,
    Attachment,
}

impl PostType {
    fn from_wxr(s: &str) -> Option<PostType> {
        match s {
            "post" => Some(PostType::Post),
            "page" => Some(PostType::Page),
            "attachment" => Some(PostType::Attachment),
            _ => None,
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            PostType::Post => "post",
            PostType::Page => "page",
            PostType::Attachment => "attachment",
        })
    }
}

/// The GMT publish date of an item. `utc` is `None` when the raw value could
/// not be parsed or the item was not published at construction time.
#[derive(Clone, Debug, PartialEq)]
pub struct PostDate {
    pub raw: String,
    pub utc: Option<DateTime<Utc>>,
}

/// Where an attachment's bytes live and what its output file is called.
#[derive(Clone, Debug, PartialEq)]
pub struct Attachment {
    /// Path relative to the uploads directory, e.g. `2010/05/photo.jpg`.
    pub source_path: String,

    /// The output file name, e.g. `photo.jpg`.
    pub filename: String,
}

/// Whether the commit sequencer has written an item yet.
#[derive(Clone, Debug, PartialEq)]
pub enum Emission {
    Unvisited,

    /// The item was written; `path` is where old URLs should now point.
    Committed { path: String },
}

/// One exported post, page, or attachment. Links to other items are indices
/// into the owning item list and are only filled in by
/// [`crate::resolve::resolve`].
#[derive(Clone, Debug)]
pub struct Item {
    pub post_id: u64,
    pub parent_id: Option<u64>,
    pub post_type: PostType,

    /// The raw `wp:status`, kept so resolution can test for `inherit`.
    pub status: String,

    pub title: Option<String>,
    pub guid: Option<String>,

    /// The public URL, percent-decoded.
    pub link: Option<String>,

    pub stub: String,
    pub published: bool,
    pub author: Option<String>,

    /// `None` when the export had no date element for this item.
    pub date: Option<PostDate>,

    /// The HTML body with line endings normalized to `\n`.
    pub body: String,

    pub categories: Vec<Category>,
    pub comments: Vec<CommentRecord>,
    pub attachment: Option<Attachment>,

    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub emission: Emission,
}

impl Item {
    /// Builds an [`Item`] from a record. Records of a type that is not
    /// exported (revisions, menu items, ...) yield `None`.
    pub fn from_record(record: Record) -> Option<Item> {
        let post_type = match PostType::from_wxr(&record.post_type) {
            Some(post_type) => post_type,
            None => {
                debug!(
                    post_id = record.post_id,
                    post_type = %record.post_type,
                    "skipping unsupported post type"
                );
                return None;
            }
        };

        let published = record.status == "publish";
        let link = record
            .link
            .as_deref()
            .map(|link| percent_decode_str(link).decode_utf8_lossy().into_owned());
        let stub = stub(
            record.guid.as_deref(),
            link.as_deref(),
            record.title.as_deref(),
        );
        let attachment = match post_type {
            PostType::Attachment => Some(attachment(&record, &stub)),
            _ => None,
        };
        let post_id = record.post_id;
        let date = record.date_gmt.map(|raw| {
            let utc = if published {
                let utc = parse_gmt(&raw);
                if utc.is_none() {
                    warn!(post_id, date = %raw, "unrecognized publish date");
                }
                utc
            } else {
                None
            };
            PostDate { raw, utc }
        });

        Some(Item {
            post_id,
            parent_id: record.parent_id,
            post_type,
            status: record.status,
            title: record.title,
            guid: record.guid,
            link,
            stub,
            published,
            author: record.creator,
            date,
            body: normalize_newlines(&record.content),
            categories: record.categories,
            comments: record.comments,
            attachment,
            parent: None,
            children: Vec::new(),
            emission: Emission::Unvisited,
        })
    }

    /// The publish timestamp, if the item has one.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date.as_ref().and_then(|date| date.utc)
    }

    /// The title, or the empty string for untitled items.
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// The path old URLs should redirect to, once the item is committed.
    pub fn new_path(&self) -> Option<&str> {
        match &self.emission {
            Emission::Committed { path } => Some(path),
            Emission::Unvisited => None,
        }
    }
}

/// Parses a WordPress GMT date such as `2010-05-01 12:00:00`.
pub fn parse_gmt(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), GMT_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn normalize_newlines(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\r', "\n")
}

fn attachment(record: &Record, stub: &str) -> Attachment {
    const UPLOADS_MARKER: &str = "/uploads/";
    let source_path = match record.meta(ATTACHED_FILE_KEY) {
        Some(path) => path.trim().trim_start_matches('/').to_owned(),
        None => match record.attachment_url.as_deref() {
            Some(url) => match url.find(UPLOADS_MARKER) {
                Some(i) => url[i + UPLOADS_MARKER.len()..].to_owned(),
                None => url.rsplit('/').next().unwrap_or_default().to_owned(),
            },
            None => String::new(),
        },
    };
    let filename = match source_path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => stub.to_owned(),
    };
    Attachment {
        source_path,
        filename,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(post_type: &str, status: &str) -> Record {
        Record {
            post_id: 1,
            post_type: post_type.to_owned(),
            status: status.to_owned(),
            title: Some(String::from("A Title")),
            guid: Some(String::from("http://example.com/?p=1")),
            link: Some(String::from("http://example.com/caf%C3%A9/")),
            creator: Some(String::from("alice")),
            content: String::from("one\r\ntwo\rthree\n"),
            date_gmt: Some(String::from("2010-05-01 12:00:00")),
            ..Record::default()
        }
    }

    #[test]
    fn test_published_post() {
        let item = Item::from_record(record("post", "publish")).unwrap();
        assert_eq!(PostType::Post, item.post_type);
        assert!(item.published);
        assert_eq!("one\ntwo\nthree\n", item.body);
        assert_eq!(Some("http://example.com/café/"), item.link.as_deref());
        assert_eq!("caf-", item.stub);
        assert_eq!(
            Some(Utc.with_ymd_and_hms(2010, 5, 1, 12, 0, 0).unwrap()),
            item.timestamp()
        );
        assert_eq!(None, item.attachment);
        assert_eq!(Emission::Unvisited, item.emission);
    }

    #[test]
    fn test_draft_has_no_timestamp() {
        let item = Item::from_record(record("post", "draft")).unwrap();
        assert!(!item.published);
        assert_eq!(None, item.timestamp());
        assert!(item.date.is_some());
    }

    #[test]
    fn test_unparseable_date_is_kept_without_timestamp() {
        let mut r = record("post", "publish");
        r.date_gmt = Some(String::from("0000-00-00 00:00:00"));
        let item = Item::from_record(r).unwrap();
        assert_eq!(None, item.timestamp());
        assert_eq!("0000-00-00 00:00:00", item.date.unwrap().raw);
    }

    #[test]
    fn test_unsupported_post_type() {
        assert!(Item::from_record(record("revision", "inherit")).is_none());
        assert!(Item::from_record(record("nav_menu_item", "publish")).is_none());
    }

    #[test]
    fn test_attachment_from_postmeta() {
        let mut r = record("attachment", "inherit");
        r.postmeta
            .push((String::from(ATTACHED_FILE_KEY), String::from("2010/05/photo.jpg")));
        let item = Item::from_record(r).unwrap();
        assert_eq!(
            Some(Attachment {
                source_path: String::from("2010/05/photo.jpg"),
                filename: String::from("photo.jpg"),
            }),
            item.attachment
        );
    }

    #[test]
    fn test_attachment_from_url() {
        let mut r = record("attachment", "inherit");
        r.attachment_url = Some(String::from(
            "http://example.com/wp-content/uploads/2011/01/cat.png",
        ));
        let item = Item::from_record(r).unwrap();
        let attachment = item.attachment.unwrap();
        assert_eq!("2011/01/cat.png", attachment.source_path);
        assert_eq!("cat.png", attachment.filename);
    }
}
