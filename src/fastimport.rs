//! Writes the git fast-import stream: `commit` blocks with inline file
//! modifications. Each record is written whole before the next one starts,
//! and the sink is flushed after every commit, since the consumer parses the
//! stream incrementally.

use std::io::{self, Write};

/// The identity written on every commit.
#[derive(Clone, Debug, PartialEq)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

/// A fast-import stream over any [`Write`] sink.
pub struct FastImport<W: Write> {
    w: W,
    branch: String,
    committer: Committer,
}

impl<W: Write> FastImport<W> {
    pub fn new(w: W, branch: &str, committer: Committer) -> FastImport<W> {
        FastImport {
            w,
            branch: branch.to_owned(),
            committer,
        }
    }

    /// Starts a commit on the configured branch. The file modifications that
    /// follow belong to it until the next call.
    pub fn commit(&mut self, timestamp: i64, message: &str) -> io::Result<()> {
        self.w.flush()?;
        writeln!(self.w, "commit refs/heads/{}", self.branch)?;
        writeln!(
            self.w,
            "committer {} <{}> {} +0000",
            self.committer.name, self.committer.email, timestamp
        )?;
        self.data(message.as_bytes())
    }

    /// Adds or replaces the file at `path` with `content`.
    pub fn modify(&mut self, path: &str, content: &[u8]) -> io::Result<()> {
        writeln!(self.w, "M 644 inline {}", path)?;
        self.data(content)
    }

    fn data(&mut self, bytes: &[u8]) -> io::Result<()> {
        writeln!(self.w, "data {}", bytes.len())?;
        self.w.write_all(bytes)?;
        self.w.write_all(b"\n")
    }

    /// Flushes and returns the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.w.flush()?;
        Ok(self.w)
    }
}
