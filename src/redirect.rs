//! Builds the redirect ledger: one line per old URL of every committed item,
//! mapping the URL's path (scheme and host removed) to the item's new path.
//! The ledger is written as a single file in one trailing commit.

use crate::config::Config;
use crate::fastimport::FastImport;
use crate::resolve::Items;
use chrono::{DateTime, Utc};
use std::io::{self, Write};
use tracing::info;
use url::{Position, Url};

/// The commit message of the ledger commit.
pub const LEDGER_MESSAGE: &str = "Importing WordPress redirects";

/// One old URL and where it now lives.
#[derive(Clone, Debug, PartialEq)]
pub struct Redirect {
    pub from: String,
    pub to: String,
}

/// Removes the `scheme://host[:port]` part of `raw`. The remainder is the
/// path and query as they appear on the wire, so non-ASCII characters come
/// out percent-encoded. Strings that are not absolute URLs are returned as
/// they are.
pub fn strip_origin(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) if url.has_host() => url[Position::BeforePath..Position::AfterQuery].to_owned(),
        _ => raw.trim().to_owned(),
    }
}

/// Lists the redirects of every committed item in document order. An item
/// contributes its GUID and its link, once each, skipping a link that
/// strips to the same path as the GUID.
pub fn redirects(items: &Items) -> Vec<Redirect> {
    let mut redirects = Vec::new();
    for item in items.iter() {
        let to = match item.new_path() {
            Some(path) => path,
            None => continue,
        };
        let mut seen: Vec<String> = Vec::with_capacity(2);
        for url in item.guid.iter().chain(item.link.iter()) {
            let from = strip_origin(url);
            if from.is_empty() || seen.contains(&from) {
                continue;
            }
            seen.push(from.clone());
            redirects.push(Redirect {
                from,
                to: to.to_owned(),
            });
        }
    }
    redirects
}

/// Renders redirects as `<old> <new>` lines.
pub fn render(redirects: &[Redirect]) -> String {
    redirects
        .iter()
        .map(|r| format!("{} {}\n", r.from, r.to))
        .collect()
}

/// Writes the ledger commit, dated at the newest committed item (or
/// `fallback_time` when no committed item has a date). Nothing is written
/// when no item was committed; returns whether a commit was written.
pub fn commit_ledger<W: Write>(
    items: &Items,
    config: &Config,
    stream: &mut FastImport<W>,
    fallback_time: DateTime<Utc>,
) -> io::Result<bool> {
    let redirects = redirects(items);
    if redirects.is_empty() {
        info!("nothing was imported; skipping the redirect ledger");
        return Ok(false);
    }
    let timestamp = items
        .iter()
        .filter(|item| item.new_path().is_some())
        .filter_map(|item| item.timestamp())
        .max()
        .unwrap_or(fallback_time);

    info!(redirects = redirects.len(), path = %config.redirects_file, "writing redirect ledger");
    stream.commit(timestamp.timestamp(), LEDGER_MESSAGE)?;
    stream.modify(
        &config.redirects_file,
        &config.encoding.encode(&render(&redirects)),
    )?;
    Ok(true)
}
