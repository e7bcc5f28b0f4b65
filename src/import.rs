//! Exports the [`import`] function which stitches together the high-level
//! steps of an import: reading the export ([`crate::wxr`]), building and
//! resolving items ([`crate::item`], [`crate::resolve`]), writing one commit
//! per top-level item ([`crate::sequence`]), and writing the redirect ledger
//! ([`crate::redirect`]).

use crate::config::Config;
use crate::fastimport::FastImport;
use crate::item::Item;
use crate::redirect::commit_ledger;
use crate::resolve::{self, resolve};
use crate::sequence::{self, Sequencer};
use crate::wxr;
use chrono::{DateTime, Utc};
use std::fmt;
use std::io::{self, Write};
use tracing::{info, info_span};

/// Counts reported at the end of an import.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    /// Records in the export, of any type.
    pub records: usize,

    /// Posts, pages, and attachments among them.
    pub items: usize,

    /// Commits written for top-level items.
    pub commits: usize,

    /// Whether the redirect ledger commit was written.
    pub ledger: bool,
}

/// Imports the WXR document `input`, writing the fast-import stream to `w`.
/// Items without a usable publish date are committed at the current time.
pub fn import<W: Write>(input: &[u8], config: &Config, w: W) -> Result<Summary> {
    import_at(input, config, w, Utc::now())
}

/// Like [`import`], with `now` as the time given to undated commits.
pub fn import_at<W: Write>(
    input: &[u8],
    config: &Config,
    w: W,
    now: DateTime<Utc>,
) -> Result<Summary> {
    let span = info_span!("import", branch = %config.branch);
    let _guard = span.enter();

    let records = wxr::parse(input)?;
    let record_count = records.len();
    let items: Vec<Item> = records.into_iter().filter_map(Item::from_record).collect();
    info!(records = record_count, items = items.len(), "read export");

    let mut items = resolve(items)?;

    let mut stream = FastImport::new(w, &config.branch, config.committer.clone());
    let commits = Sequencer::new(config, &mut stream, now).commit_all(&mut items)?;
    let ledger = commit_ledger(&items, config, &mut stream, now)?;
    stream.finish()?;

    let summary = Summary {
        records: record_count,
        items: items.len(),
        commits,
        ledger,
    };
    info!(commits = summary.commits, ledger = summary.ledger, "import finished");
    Ok(summary)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for an import. Errors can come from reading the export,
/// resolving items, writing commits, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned when the export cannot be read.
    Parse(wxr::Error),

    /// Returned when the items cannot be resolved into a tree.
    Resolve(resolve::Error),

    /// Returned for errors while writing commits.
    Sequence(sequence::Error),

    /// Returned for other I/O errors.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "Reading export: {}", err),
            Error::Resolve(err) => write!(f, "Resolving items: {}", err),
            Error::Sequence(err) => write!(f, "Writing commits: {}", err),
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Resolve(err) => Some(err),
            Error::Sequence(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    /// Converts [`io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<wxr::Error> for Error {
    /// Converts [`wxr::Error`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: wxr::Error) -> Error {
        Error::Parse(err)
    }
}

impl From<resolve::Error> for Error {
    /// Converts [`resolve::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: resolve::Error) -> Error {
        Error::Resolve(err)
    }
}

impl From<sequence::Error> for Error {
    /// Converts [`sequence::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: sequence::Error) -> Error {
        Error::Sequence(err)
    }
}
