use crate::{Error, Result};
use log::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replaces the contents of `path` with `contents`.
///
/// The data is written to a temporary file in the same directory, flushed, and then renamed
/// over `path`. Readers see either the old file or the complete new one. When `path` already
/// exists its permissions carry over to the replacement.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(directory).map_err(Error::io(path))?;
    file.write_all(contents).map_err(Error::io(path))?;
    file.as_file().sync_all().map_err(Error::io(path))?;
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(file.path(), metadata.permissions()).map_err(Error::io(path))?;
    }
    file.persist(path).map_err(|e| Error::io(path)(e.error))?;
    debug!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
