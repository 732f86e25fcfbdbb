//! Whole-file reads and rewrites for the data files.
//!
//! Reads hold a shared lock while the file is read into memory. Writes go to
//! a temp file in the destination directory which is synced and renamed over
//! the old file, so a failed save never leaves a half-written file behind.

use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Read the whole file at `path` under a shared lock.
pub fn read_locked(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = Vec::new();
    let read = std::io::BufReader::new(&file).read_to_end(&mut contents);
    file.unlock()?;
    read?;

    tracing::debug!("Read {} bytes from {:?}", contents.len(), path);
    Ok(contents)
}

/// Atomically replace the file at `path` with whatever `write` produces.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = BufWriter::new(temp.as_file());
        write(&mut writer)?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Wrote {:?}", path);
    Ok(())
}
