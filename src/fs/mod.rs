//! Crash-safe file replacement
//!
//! Both the sequence checkpoint and the status report are read by someone
//! else (a later invocation, the polling orchestrator) at arbitrary moments.
//! Neither may ever observe a half-written file, so every overwrite goes
//! through a sibling temporary file that is flushed and then renamed into
//! place.
//!
//! # Examples
//!
//! ```rust,no_run
//! use custom_script_handler::fs::atomic_write;
//!
//! # fn main() -> std::io::Result<()> {
//! atomic_write("/var/lib/azure/custom-script/seqnum".as_ref(), b"5")?;
//! # Ok(())
//! # }
//! ```
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Path of the staging file used while replacing `path`.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents` to the staging file next to `path` and flush it to disk.
///
/// The destination is left untouched; call [`publish`] to make the staged
/// contents visible.
pub fn stage(path: &Path, contents: &[u8]) -> io::Result<PathBuf> {
    let staged = staging_path(path);
    let mut file = File::create(&staged)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(staged)
}

/// Rename a staged file over its destination.
pub fn publish(staged: &Path, path: &Path) -> io::Result<()> {
    fs::rename(staged, path)
}

/// Replace `path` with `contents` so readers see either the old or the new
/// contents, never a mix.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let staged = stage(path, contents)?;
    publish(&staged, path)
}
