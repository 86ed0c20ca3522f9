//! Saving downloaded group archives to disk.
//!
//! The backend hands over an opaque binary blob plus a filename. Before
//! anything touches the download directory the blob is sniffed to confirm
//! it really is a ZIP archive, the server-supplied name is reduced to its
//! final component, and the write goes through a temporary file so a failed
//! download never leaves a half-written archive behind.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors while persisting a downloaded archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The downloaded payload is not a ZIP archive.
    #[error("downloaded payload is not a ZIP archive")]
    NotZip,
    #[error("archive read error: {0}")]
    Malformed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write archive bytes under `filename` inside `dest_dir`.
///
/// Existing files are never overwritten; a colliding name gets a numbered
/// sibling (`groups.zip`, `groups-1.zip`, ...). Returns the path written.
pub fn save_archive(bytes: &[u8], dest_dir: &Path, filename: &str) -> Result<PathBuf, ArchiveError> {
    if !infer::archive::is_zip(bytes) {
        return Err(ArchiveError::NotZip);
    }

    std::fs::create_dir_all(dest_dir)?;

    let name = safe_file_name(filename);
    let mut tmp = tempfile::NamedTempFile::new_in(dest_dir)?;
    tmp.write_all(bytes)?;

    let mut attempt = 0u32;
    loop {
        let candidate = dest_dir.join(numbered_name(&name, attempt));
        match tmp.persist_noclobber(&candidate) {
            Ok(_) => {
                debug!("Saved archive to {}", candidate.display());
                return Ok(candidate);
            }
            Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => {
                tmp = err.file;
                attempt += 1;
            }
            Err(err) => return Err(ArchiveError::Io(err.error)),
        }
    }
}

/// Names of the entries contained in an archive.
pub fn list_entries(bytes: &[u8]) -> Result<Vec<String>, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ArchiveError::Malformed(e.to_string()))?;
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| ArchiveError::Malformed(e.to_string()))?;
        names.push(entry.name().to_string());
    }
    Ok(names)
}

/// Reduce a server-supplied filename to a single safe path component.
fn safe_file_name(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        return format!("user_groups_{}.zip", stamp);
    }
    name
}

/// `groups.zip` for attempt 0, `groups-1.zip` for attempt 1, and so on.
fn numbered_name(name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, attempt, ext),
        _ => format!("{}-{}", name, attempt),
    }
}
