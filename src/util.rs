use anyhow::{anyhow, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub fn open(path: &Path, kind: &str) -> Result<File> {
    match File::open(path) {
        Err(e) => Err(anyhow!("Opening {} file `{}`: {}", kind, path.display(), e)),
        Ok(file) => Ok(file),
    }
}

/// Reads the whole export from `path`, or from standard input when no path
/// is given.
pub fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    let mut input = Vec::new();
    match path {
        Some(path) => open(path, "export")?.read_to_end(&mut input),
        None => std::io::stdin().lock().read_to_end(&mut input),
    }
    .map_err(|e| anyhow!("Reading export: {}", e))?;
    Ok(input)
}
