//! Renders approved comments as ikiwiki `._comment` files.

use crate::format::escape_attribute;
use crate::item::parse_gmt;
use crate::wxr::CommentRecord;
use tracing::warn;

/// The `wp:comment_approved` value of approved comments.
pub const APPROVED: &str = "1";

/// The delimiter around the multi-line `content` attribute.
const FENCE: &str = "\"\"\"";

/// A comment ready to be written, numbered among the approved comments of
/// its item.
#[derive(Debug, PartialEq)]
pub struct RenderedComment {
    /// 1-based position among the item's approved comments.
    pub number: usize,
    pub content: String,
}

impl RenderedComment {
    /// The comment's file name inside its item's directory.
    pub fn file_name(&self) -> String {
        format!("comment_{}._comment", self.number)
    }
}

/// Renders the approved comments of an item titled `parent_title`, in
/// document order. Unapproved comments are skipped and do not consume a
/// number.
pub fn render_comments(comments: &[CommentRecord], parent_title: &str) -> Vec<RenderedComment> {
    comments
        .iter()
        .filter(|comment| comment.approved == APPROVED)
        .enumerate()
        .map(|(i, comment)| RenderedComment {
            number: i + 1,
            content: render_comment(comment, parent_title),
        })
        .collect()
}

/// Renders one comment as a `[[!comment]]` directive.
pub fn render_comment(comment: &CommentRecord, parent_title: &str) -> String {
    let mut data = format!(
        "[[!comment format=mdwn\nusername=\"{}\"\n",
        escape_attribute(comment.author.as_deref().unwrap_or_default())
    );
    if let Some(url) = &comment.author_url {
        data.push_str(&format!("url=\"{}\"\n", escape_attribute(url)));
    }
    data.push_str(&format!(
        "subject=\"Re: {}\"\n",
        escape_attribute(parent_title)
    ));
    if let Some(raw) = &comment.date_gmt {
        match parse_gmt(raw) {
            Some(date) => data.push_str(&format!(
                "date=\"{}\"\n",
                date.format("%Y-%m-%dT%H:%M:%SZ")
            )),
            None => warn!(date = %raw, "unrecognized comment date"),
        }
    }
    if comment.content.contains(FENCE) {
        warn!(
            content = %comment.content,
            bytes = comment.content.len(),
            "comment content contains the attribute fence; emitting as-is"
        );
    }
    data.push_str(&format!(
        "content={}\n{}\n{}]]",
        FENCE, comment.content, FENCE
    ));
    data
}
