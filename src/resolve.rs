//! Links items into the tree WordPress implies: each item points at its
//! parent, parents list their children, `inherit` items take their parent's
//! published state, and attachment links in bodies are rewritten.
//!
//! Resolution is two-phase. The post-id index is built for the whole export
//! first, then every item is linked against it; linking before the index is
//! complete would silently lose parents and attachment targets.

use crate::item::{Item, PostType};
use crate::rewrite::rewrite_image_links;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// The status of items that take their parent's published state.
pub const INHERIT_STATUS: &str = "inherit";

/// The items of one export, in document order, with the post-id index.
/// Parent and child links inside the items are indices into this list.
#[derive(Debug)]
pub struct Items {
    items: Vec<Item>,
    index: HashMap<u64, usize>,
}

impl Items {
    /// Builds the post-id index over `items`. Fails on a repeated post id.
    pub fn index(items: Vec<Item>) -> Result<Items> {
        let mut index = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if index.insert(item.post_id, i).is_some() {
                return Err(Error::DuplicatePostId(item.post_id));
            }
        }
        Ok(Items { items, index })
    }

    /// Links every item against the complete index. Running it again over
    /// resolved items changes nothing.
    pub fn link(&mut self) {
        for i in 0..self.items.len() {
            self.link_item(i);
        }
    }

    fn link_item(&mut self, i: usize) {
        if let Some(parent_id) = self.items[i].parent_id {
            match self.index.get(&parent_id).copied().filter(|&p| p != i) {
                Some(parent) => {
                    if !self.items[parent].children.contains(&i) {
                        self.items[parent].children.push(i);
                    }
                    self.items[i].parent = Some(parent);
                    if self.items[i].status == INHERIT_STATUS {
                        self.items[i].published = self.effective_published(parent);
                    }
                }
                None => debug!(
                    post_id = self.items[i].post_id,
                    parent_id, "parent is not in the export"
                ),
            }
        }

        let rewritten = match rewrite_image_links(&self.items[i].body, |id| {
            self.attachment_filename(id)
        }) {
            Cow::Owned(body) => Some(body),
            Cow::Borrowed(_) => None,
        };
        if let Some(body) = rewritten {
            self.items[i].body = body;
        }
    }

    /// The published state of item `i`, following `inherit` up the parent
    /// ids. This reads source statuses only, so it does not depend on which
    /// items have been linked already. A parent cycle counts as unpublished.
    fn effective_published(&self, mut i: usize) -> bool {
        for _ in 0..self.items.len() {
            let item = &self.items[i];
            if item.status != INHERIT_STATUS {
                return item.published;
            }
            match item.parent_id.and_then(|id| self.index.get(&id)) {
                Some(&parent) => i = parent,
                None => return item.published,
            }
        }
        false
    }

    fn attachment_filename(&self, post_id: u64) -> Option<String> {
        let item = self.by_post_id(post_id)?;
        match (item.post_type, &item.attachment) {
            (PostType::Attachment, Some(attachment)) => Some(attachment.filename.clone()),
            _ => None,
        }
    }

    pub fn by_post_id(&self, post_id: u64) -> Option<&Item> {
        self.index.get(&post_id).map(|&i| &self.items[i])
    }

    pub fn get(&self, i: usize) -> &Item {
        &self.items[i]
    }

    pub fn get_mut(&mut self, i: usize) -> &mut Item {
        &mut self.items[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Indices of the items without a parent, in document order.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.items.len())
            .filter(|&i| self.items[i].parent.is_none())
            .collect()
    }
}

/// Indexes and links `items`.
pub fn resolve(items: Vec<Item>) -> Result<Items> {
    let mut items = Items::index(items)?;
    items.link();
    Ok(items)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem resolving the item tree.
#[derive(Debug)]
pub enum Error {
    /// Returned when two items share a post id.
    DuplicatePostId(u64),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DuplicatePostId(id) => write!(f, "post id {} appears more than once", id),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}
