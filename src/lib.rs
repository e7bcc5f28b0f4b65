//! The library code for the `wpimport` WordPress importer. It turns a
//! WordPress export (WXR) into a git fast-import stream of ikiwiki pages. The
//! architecture can be broken down into four steps:
//!
//! 1. Reading export records into typed items ([`crate::wxr`],
//!    [`crate::item`])
//! 2. Resolving the items into a tree ([`crate::resolve`])
//! 3. Writing one commit per top-level item ([`crate::sequence`])
//! 4. Writing the redirect ledger ([`crate::redirect`])
//!
//! The resolution step is the involved one. The export lists posts, pages,
//! and attachments in no particular order and links them only by post id, so
//! every item must be indexed before any item can find its parent, inherit
//! its published state, or have its attachment links rewritten
//! ([`crate::rewrite`]).
//!
//! Sequencing then walks the tree from each published top-level item,
//! rendering posts and pages ([`crate::format`]) and comments
//! ([`crate::comment`]) and nesting each child under its parent's stub
//! ([`crate::stub`]). Everything goes to one forward-only stream
//! ([`crate::fastimport`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod comment;
pub mod config;
pub mod encode;
pub mod fastimport;
pub mod format;
pub mod import;
pub mod item;
pub mod redirect;
pub mod resolve;
pub mod rewrite;
pub mod sequence;
pub mod stub;
pub mod tag;
pub mod util;
pub mod wxr;
