//! Walks the resolved item tree and writes one commit per published
//! top-level item. A commit holds the item's own file, its approved
//! comments, and, recursively, its published children, each child nested in
//! a directory named after its parent's stub. Parents are always written
//! before their children.

use crate::comment::render_comments;
use crate::config::Config;
use crate::fastimport::FastImport;
use crate::format::{self, format_item};
use crate::item::{Attachment, Emission, Item, PostType};
use crate::resolve::Items;
use chrono::{DateTime, Utc};
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// The extension of rendered posts and pages.
pub const PAGE_EXTENSION: &str = "mdwn";

/// Writes commits for resolved items.
pub struct Sequencer<'a, W: Write> {
    config: &'a Config,
    stream: &'a mut FastImport<W>,

    /// Committer time for items whose publish date could not be read.
    fallback_time: DateTime<Utc>,
}

impl<'a, W: Write> Sequencer<'a, W> {
    pub fn new(
        config: &'a Config,
        stream: &'a mut FastImport<W>,
        fallback_time: DateTime<Utc>,
    ) -> Sequencer<'a, W> {
        Sequencer {
            config,
            stream,
            fallback_time,
        }
    }

    /// Commits every published top-level item in document order and returns
    /// the number of commits written. Drafts are skipped silently.
    pub fn commit_all(&mut self, items: &mut Items) -> Result<usize> {
        let mut commits = 0;
        for root in items.roots() {
            let item = items.get(root);
            if !item.published || item.emission != Emission::Unvisited {
                continue;
            }
            self.commit_root(items, root)?;
            commits += 1;
        }
        Ok(commits)
    }

    fn commit_root(&mut self, items: &mut Items, root: usize) -> Result<()> {
        let item = items.get(root);
        let post_id = item.post_id;
        let timestamp = match item.timestamp() {
            Some(timestamp) => timestamp,
            None => {
                warn!(post_id, "no publish date; committing with the import time");
                self.fallback_time
            }
        };
        let message = commit_message(item);
        let dir = match item.post_type {
            PostType::Page => self.config.pages_dir.clone(),
            PostType::Post | PostType::Attachment => self.config.posts_dir.clone(),
        };

        // Everything is rendered before the header so a failure leaves no
        // empty commit behind.
        let mut files = Vec::new();
        self.stage(items, root, &dir, &mut files)?;

        info!(post_id, title = %items.get(root).title_or_empty(), "importing");
        self.stream.commit(timestamp.timestamp(), &message)?;
        for (path, content) in files {
            self.stream.modify(&path, &content)?;
        }
        Ok(())
    }

    /// Renders item `i` into `dir`, then its comments, then its published
    /// children, appending each file to `files`. An item already staged is
    /// not staged again.
    fn stage(
        &self,
        items: &mut Items,
        i: usize,
        dir: &str,
        files: &mut Vec<(String, Vec<u8>)>,
    ) -> Result<()> {
        let item = items.get(i);
        if item.emission != Emission::Unvisited {
            return Ok(());
        }

        let new_path = match (&item.attachment, item.post_type) {
            (Some(attachment), PostType::Attachment) => {
                let path = join(dir, &attachment.filename);
                files.push((path.clone(), self.read_attachment(item.post_id, attachment)));
                path
            }
            _ => {
                let content = format_item(item)?;
                let base = join(dir, &item.stub);
                files.push((
                    format!("{}.{}", base, PAGE_EXTENSION),
                    self.config.encoding.encode(&content).into_owned(),
                ));
                base
            }
        };

        let item_dir = join(dir, &item.stub);
        for comment in render_comments(&item.comments, item.title_or_empty()) {
            files.push((
                join(&item_dir, &comment.file_name()),
                self.config.encoding.encode(&comment.content).into_owned(),
            ));
        }

        debug!(post_id = item.post_id, path = %new_path, "staged");
        let children = item.children.clone();
        items.get_mut(i).emission = Emission::Committed { path: new_path };

        for child in children {
            if items.get(child).published {
                self.stage(items, child, &item_dir, files)?;
            }
        }
        Ok(())
    }

    /// Reads an attachment's bytes from the uploads directory. Failures are
    /// logged and produce an empty file.
    fn read_attachment(&self, post_id: u64, attachment: &Attachment) -> Vec<u8> {
        let uploads: &Path = match &self.config.uploads_dir {
            Some(uploads) => uploads,
            None => {
                warn!(
                    post_id,
                    file = %attachment.source_path,
                    "no uploads directory configured; committing empty attachment"
                );
                return Vec::new();
            }
        };
        let path = uploads.join(&attachment.source_path);
        match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(
                    post_id,
                    path = %path.display(),
                    error = %err,
                    "cannot read attachment; committing empty attachment"
                );
                Vec::new()
            }
        }
    }
}

/// The commit message for a top-level item.
pub fn commit_message(item: &Item) -> String {
    format!(
        "Importing WordPress {} \"{}\" [{}]",
        item.post_type,
        item.title_or_empty().replace('"', "\\\""),
        item.guid.as_deref().unwrap_or_default()
    )
}

/// Joins git path segments.
pub fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_owned()
    } else {
        format!("{}/{}", dir, name)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem writing commits.
#[derive(Debug)]
pub enum Error {
    /// Returned when an item cannot be rendered.
    Format(format::Error),

    /// Returned when the stream cannot be written.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Format(err) => write!(f, "{}", err),
            Error::Io(err) => write!(f, "writing the import stream: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Format(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<format::Error> for Error {
    /// Converts a [`format::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator when rendering items.
    fn from(err: format::Error) -> Error {
        Error::Format(err)
    }
}

impl From<io::Error> for Error {
    /// Converts a [`io::Error`] into an [`Error`]. It allows us to use the
    /// `?` operator for stream writes.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}
