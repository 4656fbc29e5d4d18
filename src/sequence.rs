//! Sequence checkpoint
//!
//! The provisioning agent numbers every logical request. The highest number
//! that has been fully handled is kept in a single file under the data
//! directory so a re-delivered or stale request is recognised across process
//! restarts.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fs::{publish, stage};
use crate::telemetry::LogContext;

/// File name of the checkpoint, relative to the data directory.
pub const SEQUENCE_FILE: &str = "seqnum";

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("failed to access sequence checkpoint {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sequence checkpoint {path} is corrupt: {contents:?}")]
    Corrupt { path: PathBuf, contents: String },
}

/// Guards against running the same request twice.
#[derive(Debug, Clone)]
pub struct SequenceGuard {
    path: PathBuf,
}

impl SequenceGuard {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SEQUENCE_FILE),
        }
    }

    /// Last committed sequence number, or `None` if nothing was processed yet.
    pub fn read(&self) -> Result<Option<u64>, SequenceError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SequenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        contents
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| SequenceError::Corrupt {
                path: self.path.clone(),
                contents,
            })
    }

    /// True when `current` was already handled or is older than what was.
    pub fn should_skip(&self, current: u64) -> Result<bool, SequenceError> {
        Ok(matches!(self.read()?, Some(checkpoint) if current <= checkpoint))
    }

    /// Advance the checkpoint to `current`.
    ///
    /// Returns `false` without touching the file when `current` would not
    /// move the checkpoint forward.
    pub fn commit(&self, current: u64, log: &LogContext) -> Result<bool, SequenceError> {
        let _span = log.span().entered();

        if let Some(checkpoint) = self.read()? {
            if current <= checkpoint {
                warn!(
                    checkpoint,
                    requested = current,
                    "Refusing to move sequence checkpoint backwards"
                );
                return Ok(false);
            }
        }

        let staged = self.stage(current)?;
        publish(&staged, &self.path).map_err(|source| SequenceError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!(seq = current, file = ?self.path, "Sequence checkpoint advanced");
        Ok(true)
    }

    fn stage(&self, current: u64) -> Result<PathBuf, SequenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SequenceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let staged = stage(&self.path, current.to_string().as_bytes()).map_err(|source| {
            SequenceError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        debug!(file = ?staged, "Staged sequence checkpoint");
        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn guard() -> (TempDir, SequenceGuard) {
        let temp_dir = TempDir::new().unwrap();
        let guard = SequenceGuard::new(temp_dir.path());
        (temp_dir, guard)
    }

    #[test]
    fn test_missing_checkpoint_reads_as_none() {
        let (_dir, guard) = guard();
        assert_eq!(guard.read().unwrap(), None);
        assert!(!guard.should_skip(0).unwrap());
    }

    #[test]
    fn test_commit_creates_checkpoint_and_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let guard = SequenceGuard::new(&temp_dir.path().join("not-yet-created"));

        assert!(guard.commit(3, &LogContext::default()).unwrap());
        assert_eq!(guard.read().unwrap(), Some(3));
    }

    #[test]
    fn test_commit_is_monotonic() {
        let (_dir, guard) = guard();
        let log = LogContext::default();

        assert!(guard.commit(7, &log).unwrap());
        assert!(!guard.commit(4, &log).unwrap());
        assert!(!guard.commit(7, &log).unwrap());

        assert_eq!(guard.read().unwrap(), Some(7));
    }

    #[test]
    fn test_interrupted_commit_keeps_previous_checkpoint() {
        let (_dir, guard) = guard();
        guard.commit(4, &LogContext::default()).unwrap();

        // Process dies after the staging write but before the rename.
        let staged = guard.stage(9).unwrap();
        assert!(staged.exists());

        assert_eq!(guard.read().unwrap(), Some(4));
        assert!(guard.should_skip(4).unwrap());
        assert!(!guard.should_skip(9).unwrap());
    }

    #[test]
    fn test_leftover_torn_staging_file_is_ignored() {
        let (dir, guard) = guard();
        guard.commit(12, &LogContext::default()).unwrap();
        // Partial write of "13" from an earlier crashed run.
        fs::write(dir.path().join("seqnum.tmp"), "1").unwrap();

        assert_eq!(guard.read().unwrap(), Some(12));
        assert!(guard.commit(13, &LogContext::default()).unwrap());
        assert_eq!(guard.read().unwrap(), Some(13));
    }

    #[test]
    fn test_corrupt_checkpoint_is_an_error() {
        let (dir, guard) = guard();
        fs::write(dir.path().join(SEQUENCE_FILE), "five").unwrap();

        assert!(matches!(
            guard.read(),
            Err(SequenceError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_checkpoint_tolerates_trailing_newline() {
        let (dir, guard) = guard();
        fs::write(dir.path().join(SEQUENCE_FILE), "5\n").unwrap();
        assert_eq!(guard.read().unwrap(), Some(5));
    }

    proptest! {
        #[test]
        fn prop_later_commit_wins(a in 0u64..10_000, b in 0u64..10_000) {
            let (_dir, guard) = guard();
            let log = LogContext::default();
            let (n1, n2) = (a.min(b), a.max(b));

            guard.commit(n1, &log).unwrap();
            guard.commit(n2, &log).unwrap();

            prop_assert_eq!(guard.read().unwrap(), Some(n2));
        }

        #[test]
        fn prop_should_skip_splits_at_checkpoint(checkpoint in 0u64..10_000, probe in 0u64..20_000) {
            let (_dir, guard) = guard();
            guard.commit(checkpoint, &LogContext::default()).unwrap();

            prop_assert_eq!(guard.should_skip(probe).unwrap(), probe <= checkpoint);
        }

        #[test]
        fn prop_observed_checkpoints_never_decrease(commits in proptest::collection::vec(0u64..500, 1..20)) {
            let (_dir, guard) = guard();
            let log = LogContext::default();
            let mut last_seen = None;

            for n in commits {
                guard.commit(n, &log).unwrap();
                let seen = guard.read().unwrap();
                prop_assert!(seen >= last_seen);
                last_seen = seen;
            }
        }
    }
}
